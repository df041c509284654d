/// Debouncing of rapid query edits.
///
/// Every new value restarts the quiet-period timer; only the last value seen
/// before a full quiet period is forwarded.

use std::time::Duration;
use tokio::sync::mpsc;

/// Spawn a task that forwards the latest value from `input` once no new value
/// has arrived for `delay`. A pending value is flushed when `input` closes.
pub fn debounce<T: Send + 'static>(mut input: mpsc::Receiver<T>, delay: Duration) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut pending: Option<T> = None;
        loop {
            match pending.take() {
                None => match input.recv().await {
                    Some(value) => pending = Some(value),
                    None => break,
                },
                Some(value) => {
                    tokio::select! {
                        next = input.recv() => match next {
                            Some(newer) => pending = Some(newer),
                            None => {
                                let _ = tx.send(value).await;
                                break;
                            }
                        },
                        _ = tokio::time::sleep(delay) => {
                            if tx.send(value).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_coalesce_to_last() {
        let (tx, rx) = mpsc::channel(16);
        let mut out = debounce(rx, Duration::from_millis(500));

        for q in ["b", "bo", "bon", "bone"] {
            tx.send(q.to_string()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        assert_eq!(out.recv().await.as_deref(), Some("bone"));
        drop(tx);
        assert_eq!(out.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separated_edits_each_pass_through() {
        let (tx, rx) = mpsc::channel(16);
        let mut out = debounce(rx, Duration::from_millis(500));

        tx.send("plant").await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        tx.send("muscle").await.unwrap();

        assert_eq!(out.recv().await, Some("plant"));
        assert_eq!(out.recv().await, Some("muscle"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_value_flushed_on_close() {
        let (tx, rx) = mpsc::channel(16);
        let mut out = debounce(rx, Duration::from_secs(10));
        tx.send(1u32).await.unwrap();
        drop(tx);
        assert_eq!(out.recv().await, Some(1));
        assert_eq!(out.recv().await, None);
    }
}
