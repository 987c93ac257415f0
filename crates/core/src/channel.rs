use std::collections::VecDeque;

use promise_lens_protocol::{Namespace, Outbound};

/// Outbound half of the port to the observed runtime.
///
/// Inbound traffic is pushed into [`crate::Panel::receive`] by whoever owns
/// the transport; the core never reads from the transport itself.
pub trait Channel {
    fn send(&mut self, message: Outbound);
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn send(&mut self, message: Outbound) {
        (**self).send(message);
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send(&mut self, message: Outbound) {
        (**self).send(message);
    }
}

/// In-memory queue of outbound messages, drained by the owner of the
/// real transport (or inspected by tests).
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    queue: VecDeque<Outbound>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<Outbound> {
        self.queue.drain(..).collect()
    }

    pub fn last(&self) -> Option<&Outbound> {
        self.queue.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outbound> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Channel for Outbox {
    fn send(&mut self, message: Outbound) {
        self.queue.push_back(message);
    }
}

/// Routes object-inspector requests to their own channel and everything
/// else to the main port.
#[derive(Debug, Clone, Default)]
pub struct SplitChannel<P, I> {
    pub port: P,
    pub inspector: I,
}

impl<P, I> SplitChannel<P, I> {
    pub fn new(port: P, inspector: I) -> Self {
        Self { port, inspector }
    }
}

impl<P: Channel, I: Channel> Channel for SplitChannel<P, I> {
    fn send(&mut self, message: Outbound) {
        match message.namespace() {
            Namespace::ObjectInspector => self.inspector.send(message),
            Namespace::Promise | Namespace::General => self.port.send(message),
        }
    }
}
