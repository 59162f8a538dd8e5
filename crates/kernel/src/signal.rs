use std::sync::mpsc::Sender;

/// Notifications published by the simulation world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// One call to `step` finished advancing the dynamics world.
    PhysicsStepped,
}

/// Fire-and-forget notification sink injected into the simulation world.
pub trait SignalBus {
    fn emit(&mut self, signal: Signal);
}

/// Discards every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSignalBus;

impl SignalBus for NullSignalBus {
    fn emit(&mut self, _signal: Signal) {}
}

impl<F> SignalBus for F
where
    F: FnMut(Signal),
{
    fn emit(&mut self, signal: Signal) {
        self(signal)
    }
}

/// Forwards signals into an mpsc channel. A disconnected receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSignalBus(pub Sender<Signal>);

impl SignalBus for ChannelSignalBus {
    fn emit(&mut self, signal: Signal) {
        if self.0.send(signal).is_err() {
            tracing::trace!(?signal, "signal receiver dropped");
        }
    }
}
