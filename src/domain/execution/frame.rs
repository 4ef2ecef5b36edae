//! Stack frame - one contiguous run of handler activations, nested by delegation

use tracing::trace;

use crate::domain::chain::Chain;
use crate::domain::ChainError;

use super::activation::Activation;
use super::id::ExecutionId;
use super::invocation::Invocation;

/// Activations of one chain within a frame
struct CallLevel<C, T> {
    chain: Chain<C, T>,
    activations: Vec<Activation<C, T>>,
}

impl<C, T> CallLevel<C, T> {
    fn new(chain: Chain<C, T>) -> Self {
        Self {
            chain,
            activations: Vec::new(),
        }
    }
}

/// LIFO of suspended handler activations
///
/// The base level belongs to the chain the frame was created for and resolves
/// handlers starting at `offset`. Each delegation adds a nested level that
/// always starts at index 0 of its own chain.
pub(crate) struct StackFrame<C, T> {
    execution_id: ExecutionId,
    base: CallLevel<C, T>,
    nested: Vec<CallLevel<C, T>>,
    offset: usize,
}

impl<C, T> StackFrame<C, T>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    pub(crate) fn new(execution_id: ExecutionId, chain: Chain<C, T>, offset: usize) -> Self {
        Self {
            execution_id,
            base: CallLevel::new(chain),
            nested: Vec::new(),
            offset,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nested.is_empty() && self.base.activations.is_empty()
    }

    /// Topmost live activation
    pub(crate) fn head(&mut self) -> Result<&mut Activation<C, T>, ChainError> {
        self.top_mut()
            .activations
            .last_mut()
            .ok_or(ChainError::EmptyHead)
    }

    /// Chain of the innermost delegation level
    pub(crate) fn top_chain(&self) -> &Chain<C, T> {
        &self.top().chain
    }

    /// Activate the next handler of the innermost level with `context`
    pub(crate) fn push(&mut self, context: C) -> Result<(), ChainError> {
        let index = self.next_handler_index();
        let execution_id = self.execution_id;

        let Some(named) = self.top().chain.handler_at(index) else {
            // a delegation that never got its first handler is abandoned
            self.trim_top();
            return Err(ChainError::NoFurtherHandlers);
        };

        let level = self.top_mut();
        trace!(
            execution_id = %execution_id,
            chain = %level.chain.id(),
            handler = %named.name(),
            index,
            "Activating handler"
        );

        let invocation = Invocation::new(execution_id, level.chain.clone(), context, index + 1);
        level.activations.push(Activation::new(
            named.shared_name(),
            named.handler().clone(),
            invocation,
        ));

        Ok(())
    }

    /// Drop the topmost activation, unwinding a finished delegation
    pub(crate) fn pop(&mut self) -> Result<(), ChainError> {
        if self.top_mut().activations.pop().is_none() {
            return Err(ChainError::EmptyPop);
        }
        self.trim_top();
        Ok(())
    }

    /// Begin a nested delegation into `chain`
    pub(crate) fn delegate(&mut self, chain: Chain<C, T>) {
        self.nested.push(CallLevel::new(chain));
    }

    /// Detach a fresh frame that continues the innermost level after its current position
    pub(crate) fn split(&mut self) -> Self {
        let frame = Self::new(
            self.execution_id,
            self.top_chain().clone(),
            self.next_handler_index(),
        );
        self.trim_top();
        frame
    }

    fn next_handler_index(&self) -> usize {
        let offset = if self.nested.is_empty() { self.offset } else { 0 };
        self.top().activations.len() + offset
    }

    fn trim_top(&mut self) {
        if self
            .nested
            .last()
            .is_some_and(|level| level.activations.is_empty())
        {
            self.nested.pop();
        }
    }

    fn top(&self) -> &CallLevel<C, T> {
        self.nested.last().unwrap_or(&self.base)
    }

    fn top_mut(&mut self) -> &mut CallLevel<C, T> {
        match self.nested.last_mut() {
            Some(level) => level,
            None => &mut self.base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::ChainBuilder;
    use crate::domain::execution::activation::{Resume, Step};
    use crate::domain::execution::handler::Flow;
    use crate::domain::execution::pending::MaybeAsync;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(String, i32, usize)>>>;

    /// Chain whose handlers record (name, context, offset) and return their index
    fn recording_chain(id: &str, size: usize, seen: &Seen) -> Chain<i32, i32> {
        let mut builder = ChainBuilder::new(id);
        for i in 0..size {
            let seen = seen.clone();
            let name = format!("{}-h{}", id, i);
            let label = name.clone();
            builder = builder.append(name, move |inv: Invocation<i32, i32>| {
                seen.lock()
                    .unwrap()
                    .push((label.clone(), *inv.context(), inv.offset()));
                Flow::value(i as i32)
            });
        }
        builder.build().unwrap()
    }

    fn start_head(frame: &mut StackFrame<i32, i32>) -> i32 {
        match frame.head().unwrap().resume(Resume::Start).ok().unwrap() {
            Step::Return(MaybeAsync::Ready(value)) => value,
            _ => panic!("expected a returned value"),
        }
    }

    #[test]
    fn test_new_frame_is_empty() {
        let seen = Seen::default();
        let chain = recording_chain("c", 1, &seen);
        let mut frame = StackFrame::new(ExecutionId::next(), chain.clone(), 0);

        assert!(frame.is_empty());
        assert!(frame.top_chain().same_as(&chain));
        assert_eq!(
            frame.head().err().unwrap().to_string(),
            "Cannot access head for empty callstack."
        );
    }

    #[test]
    fn test_push_resolves_handlers_in_order() {
        let seen = Seen::default();
        let chain = recording_chain("c", 2, &seen);
        let mut frame = StackFrame::new(ExecutionId::next(), chain, 0);

        frame.push(10).unwrap();
        assert!(!frame.is_empty());
        assert_eq!(start_head(&mut frame), 0);

        frame.push(20).unwrap();
        assert_eq!(start_head(&mut frame), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![("c-h0".to_string(), 10, 1), ("c-h1".to_string(), 20, 2)]
        );
    }

    #[test]
    fn test_push_honors_offset() {
        let seen = Seen::default();
        let chain = recording_chain("c", 3, &seen);
        let mut frame = StackFrame::new(ExecutionId::next(), chain, 2);

        frame.push(1).unwrap();
        assert_eq!(start_head(&mut frame), 2);
        assert_eq!(seen.lock().unwrap()[0].0, "c-h2");
    }

    #[test]
    fn test_push_past_end_fails() {
        let seen = Seen::default();
        let chain = recording_chain("c", 1, &seen);
        let mut frame = StackFrame::new(ExecutionId::next(), chain, 0);

        frame.push(1).unwrap();
        let error = frame.push(2).err().unwrap();
        assert_eq!(error.to_string(), "No further handlers registered.");
    }

    #[test]
    fn test_pop() {
        let seen = Seen::default();
        let chain = recording_chain("c", 2, &seen);
        let mut frame = StackFrame::new(ExecutionId::next(), chain, 0);

        frame.push(1).unwrap();
        frame.push(2).unwrap();
        frame.pop().unwrap();
        assert!(!frame.is_empty());
        frame.pop().unwrap();
        assert!(frame.is_empty());

        assert_eq!(frame.pop().err().unwrap().to_string(), "Cannot pop an empty callstack.");
    }

    #[test]
    fn test_delegate_starts_nested_chain_at_zero() {
        let seen = Seen::default();
        let outer = recording_chain("outer", 3, &seen);
        let inner = recording_chain("inner", 2, &seen);
        let mut frame = StackFrame::new(ExecutionId::next(), outer.clone(), 1);

        frame.push(1).unwrap();
        frame.delegate(inner.clone());
        assert!(frame.top_chain().same_as(&inner));

        frame.push(2).unwrap();
        assert_eq!(start_head(&mut frame), 0);

        frame.pop().unwrap();
        // the emptied delegation level is unwound back to the caller
        assert!(frame.top_chain().same_as(&outer));
        assert_eq!(start_head(&mut frame), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], ("inner-h0".to_string(), 2, 1));
        assert_eq!(seen[1], ("outer-h1".to_string(), 1, 2));
    }

    #[test]
    fn test_failed_push_abandons_empty_delegation() {
        let seen = Seen::default();
        let outer = recording_chain("outer", 1, &seen);
        let empty = ChainBuilder::<i32, i32>::new("empty").build().unwrap();
        let mut frame = StackFrame::new(ExecutionId::next(), outer.clone(), 0);

        frame.push(1).unwrap();
        frame.delegate(empty);
        assert!(frame.push(2).is_err());
        assert!(frame.top_chain().same_as(&outer));
        assert_eq!(start_head(&mut frame), 0);
    }

    #[test]
    fn test_split_continues_after_current_position() {
        let seen = Seen::default();
        let chain = recording_chain("c", 3, &seen);
        let mut frame = StackFrame::new(ExecutionId::next(), chain.clone(), 0);

        frame.push(1).unwrap();
        let mut detached = frame.split();
        assert!(detached.is_empty());
        assert!(!frame.is_empty());
        assert!(detached.top_chain().same_as(&chain));

        detached.push(5).unwrap();
        assert_eq!(start_head(&mut detached), 1);
    }

    #[test]
    fn test_split_moves_fresh_delegation_to_new_frame() {
        let seen = Seen::default();
        let outer = recording_chain("outer", 2, &seen);
        let inner = recording_chain("inner", 2, &seen);
        let mut frame = StackFrame::new(ExecutionId::next(), outer.clone(), 0);

        frame.push(1).unwrap();
        frame.delegate(inner.clone());
        let mut detached = frame.split();

        assert!(frame.top_chain().same_as(&outer));
        assert!(detached.top_chain().same_as(&inner));
        detached.push(3).unwrap();
        assert_eq!(start_head(&mut detached), 0);
    }
}
