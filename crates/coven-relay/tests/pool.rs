#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;

use coven_relay::server::WorkerPool;

#[tokio::test]
async fn zero_size_is_clamped() {
    assert_eq!(WorkerPool::new(0).capacity(), 1);
}

#[tokio::test]
async fn excess_work_queues_instead_of_failing() {
    let pool = WorkerPool::new(1);
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let (second_tx, mut second_rx) = oneshot::channel::<()>();

    pool.submit(async move {
        let _ = release_rx.await;
    });
    pool.submit(async move {
        let _ = second_tx.send(());
    });

    // second task waits for the only worker
    assert!(timeout(Duration::from_millis(200), &mut second_rx).await.is_err());
    assert_eq!(pool.busy(), 1);

    release_tx.send(()).unwrap();
    timeout(Duration::from_secs(2), second_rx).await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_now_interrupts_and_rejects() {
    let pool = WorkerPool::new(1);
    let (started_tx, started_rx) = oneshot::channel::<()>();
    let (dropped_tx, dropped_rx) = oneshot::channel::<()>();

    struct SignalOnDrop(Option<oneshot::Sender<()>>);
    impl Drop for SignalOnDrop {
        fn drop(&mut self) {
            if let Some(tx) = self.0.take() {
                let _ = tx.send(());
            }
        }
    }

    pool.submit(async move {
        let _guard = SignalOnDrop(Some(dropped_tx));
        let _ = started_tx.send(());
        std::future::pending::<()>().await;
    });
    started_rx.await.unwrap();

    pool.shutdown_now();
    assert!(pool.is_shutdown());
    timeout(Duration::from_secs(2), dropped_rx).await.unwrap().unwrap();

    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    pool.submit(async move {
        flag.store(true, Ordering::SeqCst);
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!ran.load(Ordering::SeqCst));
}
