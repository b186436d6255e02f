use std::collections::VecDeque;

use crate::solver::{message::Envelope, semantics::DomainSemantics};

/// The asynchronous channel between agents, modelled as a single FIFO
/// delivery queue.
///
/// Global FIFO delivery trivially preserves the one ordering guarantee the
/// protocol needs — messages from a given sender to a given receiver arrive
/// in send order. Handlers never block on the router: they enqueue their
/// outbound envelopes and return, and the next state transition happens
/// when the next envelope is delivered.
pub struct Router<S: DomainSemantics> {
    queue: VecDeque<Envelope<S>>,
    delivered: u64,
}

impl<S: DomainSemantics> Router<S> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            delivered: 0,
        }
    }

    pub fn send(&mut self, envelope: Envelope<S>) {
        self.queue.push_back(envelope);
    }

    pub fn send_all(&mut self, envelopes: impl IntoIterator<Item = Envelope<S>>) {
        self.queue.extend(envelopes);
    }

    pub fn deliver(&mut self) -> Option<Envelope<S>> {
        let envelope = self.queue.pop_front();
        if envelope.is_some() {
            self.delivered += 1;
        }
        envelope
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total envelopes delivered so far, for the run harness's budget.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl<S: DomainSemantics> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::solver::{
        constraint::CostFunction,
        cost::Cost,
        message::{Message, Recipient},
        value::StandardValue,
    };

    #[derive(Debug, Clone)]
    struct TestSemantics;

    impl DomainSemantics for TestSemantics {
        type Value = StandardValue;
        type ConstraintDefinition = ();

        fn build_constraint(
            &self,
            _definition: &Self::ConstraintDefinition,
        ) -> Box<dyn CostFunction<Self>> {
            unimplemented!("Not needed for router unit tests")
        }
    }

    fn cost_envelope(sender: u32, receiver: u32, cost: f64) -> Envelope<TestSemantics> {
        Envelope::to_agent(
            sender,
            receiver,
            Message::Cost {
                cost: Cost::Feasible(cost),
            },
        )
    }

    #[test]
    fn delivery_preserves_per_pair_send_order() {
        let mut router: Router<TestSemantics> = Router::new();
        router.send(cost_envelope(1, 0, 10.0));
        router.send(cost_envelope(2, 0, 20.0));
        router.send(cost_envelope(1, 0, 11.0));

        let mut from_one = Vec::new();
        while let Some(envelope) = router.deliver() {
            if envelope.sender == Some(1) {
                if let Message::Cost { cost } = envelope.message {
                    from_one.push(cost);
                }
            }
        }
        assert_eq!(from_one, vec![Cost::Feasible(10.0), Cost::Feasible(11.0)]);
        assert_eq!(router.delivered(), 3);
    }

    #[test]
    fn an_empty_router_delivers_nothing() {
        let mut router: Router<TestSemantics> = Router::new();
        assert!(router.is_empty());
        assert!(router.deliver().is_none());
        assert_eq!(router.delivered(), 0);
    }

    #[test]
    fn recipient_is_preserved() {
        let mut router: Router<TestSemantics> = Router::new();
        router.send(Envelope::to_sink(
            3,
            Message::BoundReport { bound: 0.5 },
        ));

        let envelope = router.deliver().unwrap();
        assert_eq!(envelope.receiver, Recipient::StatsSink);
        assert_eq!(envelope.sender, Some(3));
    }
}
