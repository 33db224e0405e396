use std::sync::Arc;

use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle},
};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::{encoding::Encoding, error::Error, generator::Generator, time::TimeSource};

/// Handle to a background task that continuously mints identifiers.
///
/// The task owns the sending half of two channels: a bounded data channel of
/// identifiers and a single-slot error channel. It stops, dropping both
/// senders, when any of the following happens:
///
/// - [`IdStream::stop`] is called (or the token from
///   [`IdStream::stop_token`] is cancelled);
/// - the consumer closes or drops the data receiver;
/// - generation fails, in which case the error is delivered on the error
///   channel first.
///
/// Backpressure comes only from the data channel's capacity and the pace of
/// the consumer. The task reserves a slot before minting, so no identifier is
/// generated that cannot be delivered.
#[derive(Debug)]
pub struct IdStream<O> {
    ids: mpsc::Receiver<O>,
    errors: mpsc::Receiver<Error>,
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl<O> IdStream<O> {
    /// Receives the next identifier, or `None` once the producer has stopped
    /// and the buffer is drained.
    pub async fn recv(&mut self) -> Option<O> {
        self.ids.recv().await
    }

    /// Returns the terminal error if one has already been delivered, without
    /// waiting.
    pub fn try_recv_error(&mut self) -> Option<Error> {
        self.errors.try_recv().ok()
    }

    /// Waits for the terminal error. Returns `None` if the producer stopped
    /// for any other reason.
    pub async fn next_error(&mut self) -> Option<Error> {
        self.errors.recv().await
    }

    /// Asks the producer to stop. Identifiers already buffered can still be
    /// received.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// A token that stops the producer when cancelled.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Closes the data channel from the consumer side. The producer notices
    /// on its next send and terminates.
    pub fn close_ids(&mut self) {
        self.ids.close();
    }

    /// Whether the producer task has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the producer task to finish.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] if the task panicked or was aborted.
    pub async fn join(self) -> Result<(), JoinError> {
        self.handle.await
    }

    /// Splits the handle into its receivers, stop token and task handle.
    pub fn into_parts(
        self,
    ) -> (
        mpsc::Receiver<O>,
        mpsc::Receiver<Error>,
        CancellationToken,
        JoinHandle<()>,
    ) {
        (self.ids, self.errors, self.stop, self.handle)
    }

    /// Adapts the data channel into a [`futures::Stream`]. The error channel
    /// is dropped; the producer stops once the stream is dropped.
    ///
    /// [`futures::Stream`]: tokio_stream::Stream
    pub fn into_stream(self) -> ReceiverStream<O> {
        ReceiverStream::new(self.ids)
    }
}

impl<T> Generator<T>
where
    T: TimeSource + Send + Sync + 'static,
{
    /// Spawns a producer that mints identifiers in encoding `E` into a
    /// channel of `capacity` (at least 1).
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use nodeflake::{Generator, GeneratorConfig, StaticHostname, U64Encoding};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let config = GeneratorConfig::builder()
    ///     .process_override(1)
    ///     .hostname_source(StaticHostname::new("app-1"))
    ///     .build();
    /// let generator = Arc::new(Generator::new(&config).unwrap());
    ///
    /// let mut stream = generator.spawn_stream::<U64Encoding>(16);
    /// let first = stream.recv().await.unwrap();
    /// let second = stream.recv().await.unwrap();
    /// assert_ne!(first, second);
    ///
    /// stream.stop();
    /// stream.join().await.unwrap();
    /// # }
    /// ```
    pub fn spawn_stream<E>(self: &Arc<Self>, capacity: usize) -> IdStream<E::Output>
    where
        E: Encoding + 'static,
    {
        let (id_tx, ids) = mpsc::channel(capacity.max(1));
        let (err_tx, errors) = mpsc::channel(1);
        let stop = CancellationToken::new();

        let handle = tokio::spawn(produce::<E, T>(
            Arc::clone(self),
            id_tx,
            err_tx,
            stop.clone(),
        ));

        IdStream {
            ids,
            errors,
            stop,
            handle,
        }
    }
}

async fn produce<E, T>(
    generator: Arc<Generator<T>>,
    id_tx: mpsc::Sender<E::Output>,
    err_tx: mpsc::Sender<Error>,
    stop: CancellationToken,
) where
    E: Encoding + 'static,
    T: TimeSource + Send + Sync + 'static,
{
    loop {
        let permit = tokio::select! {
            biased;
            () = stop.cancelled() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Id stream stopped by request");
                return;
            }
            permit = id_tx.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Id stream consumer closed the channel");
                    return;
                }
            },
        };

        match generator.try_next::<E>() {
            Ok(id) => permit.send(id),
            Err(e) => {
                drop(permit);
                #[cfg(feature = "tracing")]
                tracing::warn!("Id stream terminating after generation error: {e}");
                if let Err(_e) = err_tx.send(e).await {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Id stream failed to deliver error: {_e}");
                }
                return;
            }
        }
    }
}
