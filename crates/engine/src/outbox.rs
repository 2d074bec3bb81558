//! Sink for messages the engine sends to the host.

use reval_rpc::CoreMessage;

/// Receives core → host messages in the order they must be delivered.
pub trait Outbox {
	fn post(&mut self, message: CoreMessage);
}

impl Outbox for Vec<CoreMessage> {
	fn post(&mut self, message: CoreMessage) {
		self.push(message);
	}
}

impl<O: Outbox + ?Sized> Outbox for &mut O {
	fn post(&mut self, message: CoreMessage) {
		(**self).post(message);
	}
}
