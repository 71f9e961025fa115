use crate::core::emsg::EMsg;
use crate::core::envelope::Envelope;
use crate::error::{constants, ProtocolError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::trace;

type HandlerFn = dyn Fn(&Envelope) -> Result<()> + Send + Sync + 'static;

/// Routes classified envelopes to handlers by base message kind.
///
/// Cloning shares the handler table.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<EMsg, Arc<HandlerFn>>>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered = self.handlers.read().map(|h| h.len()).ok();
        f.debug_struct("Dispatcher")
            .field("registered", &registered)
            .finish()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers `handler` for `kind`, replacing any previous one.
    pub fn register<F>(&self, kind: EMsg, handler: F) -> Result<()>
    where
        F: Fn(&Envelope) -> Result<()> + Send + Sync + 'static,
    {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string()))?;

        handlers.insert(kind, Arc::new(handler));
        Ok(())
    }

    /// Removes the handler for `kind`. Returns whether one was registered.
    pub fn unregister(&self, kind: EMsg) -> Result<bool> {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string()))?;

        Ok(handlers.remove(&kind).is_some())
    }

    pub fn is_registered(&self, kind: EMsg) -> Result<bool> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string()))?;

        Ok(handlers.contains_key(&kind))
    }

    /// Runs the handler registered for the envelope's kind.
    ///
    /// An envelope without a handler is `UnhandledMessage`; callers treat it
    /// as "ignore". The table lock is released before the handler runs, so a
    /// handler may register or unregister handlers itself.
    pub fn dispatch(&self, envelope: &Envelope) -> Result<()> {
        let kind = envelope.kind();

        let handler = {
            let handlers = self
                .handlers
                .read()
                .map_err(|_| ProtocolError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string()))?;
            handlers
                .get(&kind)
                .cloned()
                .ok_or(ProtocolError::UnhandledMessage(kind))?
        };

        trace!(?kind, "Dispatching envelope");
        handler(envelope)
    }
}
