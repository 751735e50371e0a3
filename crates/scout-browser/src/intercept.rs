//! Response interception on top of CDP network events.
//!
//! A background task follows the request lifecycle of every URL matching the
//! subscribed prefix and forwards the finished exchange through a channel, so
//! the consumer's control loop never blocks the event pump. Dropping the
//! returned stream aborts the task.

use crate::actions::{ExchangeOutcome, InterceptedExchange, ResponseStream};
use crate::error::Result;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, EventResponseReceived,
    GetResponseBodyParams, RequestId,
};
use chromiumoxide::Page;
use futures_util::stream::{Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct PendingRequest {
    request_id: RequestId,
    url: String,
    status: u16,
}

/// Start forwarding exchanges whose URL starts with `prefix`.
pub(crate) async fn subscribe(page: &Page, prefix: &str) -> Result<ResponseStream> {
    let mut sent = page.event_listener::<EventRequestWillBeSent>().await?;
    let mut received = page.event_listener::<EventResponseReceived>().await?;
    let mut finished = page.event_listener::<EventLoadingFinished>().await?;
    let mut failed = page.event_listener::<EventLoadingFailed>().await?;

    let (tx, rx) = mpsc::unbounded_channel();
    let page = page.clone();
    let prefix = prefix.to_string();

    let pump = tokio::spawn(async move {
        let mut pending: HashMap<String, PendingRequest> = HashMap::new();

        loop {
            let exchange = tokio::select! {
                Some(event) = sent.next() => {
                    if event.request.url.starts_with(&prefix) {
                        pending.insert(
                            event.request_id.inner().clone(),
                            PendingRequest {
                                request_id: event.request_id.clone(),
                                url: event.request.url.clone(),
                                status: 0,
                            },
                        );
                    }
                    None
                }
                Some(event) = received.next() => {
                    if let Some(request) = pending.get_mut(event.request_id.inner()) {
                        request.status = u16::try_from(event.response.status).unwrap_or(0);
                    }
                    None
                }
                Some(event) = finished.next() => {
                    match pending.remove(event.request_id.inner()) {
                        Some(request) => Some(read_body(&page, request).await),
                        None => None,
                    }
                }
                Some(event) = failed.next() => {
                    pending.remove(event.request_id.inner()).map(|request| InterceptedExchange {
                        url: request.url,
                        status: request.status,
                        outcome: ExchangeOutcome::Failed(event.error_text.clone()),
                    })
                }
                () = tx.closed() => break,
                else => break,
            };

            if let Some(exchange) = exchange {
                tracing::debug!(url = %exchange.url, status = exchange.status, "Intercepted response");
                if tx.send(exchange).is_err() {
                    break;
                }
            }
        }
        tracing::debug!(prefix = %prefix, "Response subscription ended");
    });

    Ok(Subscription { rx, pump }.boxed())
}

/// Receiving end of a subscription. Owns the pump task.
struct Subscription {
    rx: mpsc::UnboundedReceiver<InterceptedExchange>,
    pump: JoinHandle<()>,
}

impl Stream for Subscription {
    type Item = InterceptedExchange;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn read_body(page: &Page, request: PendingRequest) -> InterceptedExchange {
    let outcome = match page
        .execute(GetResponseBodyParams::new(request.request_id))
        .await
    {
        Ok(response) if response.result.base64_encoded => {
            ExchangeOutcome::Failed("binary response body".to_string())
        }
        Ok(response) => ExchangeOutcome::Body(response.result.body.clone()),
        Err(e) => ExchangeOutcome::Failed(format!("failed to read body: {e}")),
    };

    InterceptedExchange {
        url: request.url,
        status: request.status,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn exchange(url: &str) -> InterceptedExchange {
        InterceptedExchange {
            url: url.to_string(),
            status: 200,
            outcome: ExchangeOutcome::Body("{}".to_string()),
        }
    }

    #[tokio::test]
    async fn test_subscription_forwards_exchanges() {
        let (tx, rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(async move {
            tx.send(exchange("https://example.com/a")).ok();
        });
        let mut subscription = Subscription { rx, pump };

        let first = subscription.next().await.expect("exchange");
        assert_eq!(first.url, "https://example.com/a");
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_subscription_stops_pump() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let (alive, stopped) = oneshot::channel::<()>();
        // Never sends, so only an abort ends it
        let pump = tokio::spawn(async move {
            let _alive = alive;
            std::future::pending::<()>().await;
        });

        drop(Subscription { rx, pump });

        let result = tokio::time::timeout(Duration::from_secs(1), stopped)
            .await
            .expect("pump still running");
        assert!(result.is_err());
    }
}
