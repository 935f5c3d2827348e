use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use interact_spec::{AutosubmitResult, Event, FinalEvent};
use tokio::sync::mpsc;

use crate::error::InteractError;

pub type SinkItem = Result<Event, InteractError>;

/// How a fully drained run ended.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub last: FinalEvent,
    pub autosubmit: Option<AutosubmitResult>,
}

/// Ordered, single-pass stream of the events one run produces.
///
/// The producing task waits whenever the bounded buffer is full, so a slow
/// consumer throttles the traversal instead of growing a queue. The stream
/// ends right after `final` or right after the first error.
#[derive(Debug)]
pub struct EventSink {
    rx: mpsc::Receiver<SinkItem>,
    closed: bool,
}

impl EventSink {
    pub(crate) fn new(rx: mpsc::Receiver<SinkItem>) -> Self {
        Self { rx, closed: false }
    }

    pub async fn next_event(&mut self) -> Option<SinkItem> {
        if self.closed {
            return None;
        }
        let item = self.rx.recv().await;
        self.observe(&item);
        item
    }

    /// Feeds every event to `on_event` and returns how the run ended.
    ///
    /// An autosubmit run yields one `autosubmit` event and then `final`;
    /// its result lands in [`Completion::autosubmit`]. Interactive runs
    /// leave that field `None`.
    pub async fn drain<F>(mut self, mut on_event: F) -> Result<Completion, InteractError>
    where
        F: FnMut(&Event),
    {
        let mut autosubmit = None;
        while let Some(item) = self.next_event().await {
            let event = item?;
            on_event(&event);
            match event {
                Event::Autosubmit(result) => autosubmit = Some(result),
                Event::Final(last) => return Ok(Completion { last, autosubmit }),
                _ => {}
            }
        }
        Err(InteractError::Incomplete)
    }

    /// Collects every event along with the error that ended the run, if any.
    pub async fn collect_events(mut self) -> (Vec<Event>, Option<InteractError>) {
        let mut events = Vec::new();
        while let Some(item) = self.next_event().await {
            match item {
                Ok(event) => events.push(event),
                Err(err) => return (events, Some(err)),
            }
        }
        (events, None)
    }

    fn observe(&mut self, item: &Option<SinkItem>) {
        match item {
            Some(Ok(event)) if !event.is_final() => {}
            _ => {
                self.closed = true;
                self.rx.close();
            }
        }
    }
}

impl Stream for EventSink {
    type Item = SinkItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.closed {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(item) => {
                self.observe(&item);
                Poll::Ready(item)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
