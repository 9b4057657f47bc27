//! The HTTP gun: one ammo item in, one request out, one sample reported

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::StreamExt;
use tokio::sync::mpsc;

use volley_core::{Ammo, Gun, Sample, ShootError};

use crate::request::HttpRequest;
use crate::transport::{TargetResponse, Transport, TransportError};

/// Optional connection-setup hook run in place of a measured shot.
pub type ConnectFn = Box<dyn FnMut() -> BoxFuture<'static, Result<(), TransportError>> + Send>;

/// Per-worker HTTP executor.
///
/// Follows the [`Gun`] two-phase lifecycle: bind the results sink once, then
/// shoot sequentially. Every measured shot reports exactly one [`Sample`],
/// success or failure. The response body is always drained to completion on
/// the success path: leaving bytes unread would misrepresent the transfer's
/// cost and health.
pub struct HttpGun<T: Transport> {
    transport: T,
    connect: Option<ConnectFn>,
    results: Option<mpsc::Sender<Sample>>,
}

impl<T: Transport> HttpGun<T> {
    /// Gun over the given transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            connect: None,
            results: None,
        }
    }

    /// Install a connection-setup hook.
    ///
    /// While set, `shoot` performs the hook instead of a measured shot: its
    /// outcome becomes the call's result and no sample is emitted.
    pub fn with_connect(mut self, connect: ConnectFn) -> Self {
        self.connect = Some(connect);
        self
    }

    async fn fire(&mut self, req: HttpRequest, sample: &mut Sample) -> Result<(), ShootError> {
        let TargetResponse { status, mut body } = self
            .transport
            .send(req)
            .await
            .map_err(|err| ShootError::Issue(err.to_string()))?;

        // stamped before draining: a read failure past this point leaves
        // both the code and the error on the same sample
        sample.set_proto_code(status);

        let mut drained: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|err| ShootError::BodyRead(err.to_string()))?;
            drained += chunk.len() as u64;
        }
        sample.set_bytes_read(drained);

        Ok(())
    }
}

#[async_trait]
impl<T: Transport> Gun for HttpGun<T> {
    type Payload = HttpRequest;

    fn bind_results(&mut self, results: mpsc::Sender<Sample>) {
        assert!(self.results.is_none(), "results sink already bound");
        self.results = Some(results);
    }

    async fn shoot(&mut self, ammo: &mut Ammo<HttpRequest>) -> Result<(), ShootError> {
        let results = self
            .results
            .clone()
            .expect("must bind results before shoot");

        if let Some(connect) = self.connect.as_mut() {
            // connection setup, not a measured shot: no sample on this path
            let outcome = connect().await;
            if let Err(error) = &outcome {
                tracing::warn!(%error, "connect hook failed");
            }
            return outcome.map_err(|err| ShootError::Connect(err.to_string()));
        }

        let mut sample = Sample::begin(ammo.tag());
        let outcome = match ammo.take_payload() {
            Some(req) => self.fire(req, &mut sample).await,
            None => Err(ShootError::NoPayload),
        };
        if let Err(error) = &outcome {
            tracing::warn!(ammo_id = ammo.id(), %error, "shot failed");
            sample.set_err(error.to_string());
        }
        sample.finish();

        // every exit path of a measured shot reports exactly one sample
        if results.send(sample).await.is_err() {
            tracing::debug!("results sink closed, sample dropped");
        }

        outcome
    }
}
