//! Execution stack - the frames of one logical continuation

use crate::domain::chain::Chain;
use crate::domain::ChainError;

use super::activation::Activation;
use super::frame::StackFrame;
use super::id::ExecutionId;

/// Top slot of a stack; `Exhausted` once every frame has been split away
enum Frame<C, T> {
    Active(StackFrame<C, T>),
    Exhausted,
}

impl<C, T> Frame<C, T>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    fn is_empty(&self) -> bool {
        match self {
            Self::Active(frame) => frame.is_empty(),
            Self::Exhausted => true,
        }
    }

    fn active(&mut self, op: &'static str) -> Result<&mut StackFrame<C, T>, ChainError> {
        match self {
            Self::Active(frame) => Ok(frame),
            Self::Exhausted => Err(ChainError::empty_frame(op)),
        }
    }
}

/// Ordered stack of frames driven by one executor
pub(crate) struct ExecutionStack<C, T> {
    execution_id: ExecutionId,
    offset: usize,
    top: Frame<C, T>,
    below: Vec<StackFrame<C, T>>,
}

impl<C, T> ExecutionStack<C, T>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    pub(crate) fn new(
        execution_id: ExecutionId,
        chain: Chain<C, T>,
        offset: usize,
    ) -> Result<Self, ChainError> {
        if chain.is_empty() {
            return Err(ChainError::NoHandlers);
        }

        Ok(Self {
            execution_id,
            offset,
            top: Frame::Active(StackFrame::new(execution_id, chain, offset)),
            below: Vec::new(),
        })
    }

    pub(crate) fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.below.is_empty() && self.top.is_empty()
    }

    pub(crate) fn head(&mut self) -> Result<&mut Activation<C, T>, ChainError> {
        self.top.active("head")?.head()
    }

    /// Activate the next handler; an async push first splits off a new top frame
    pub(crate) fn push(&mut self, context: C, is_async: bool) -> Result<(), ChainError> {
        let top = self.top.active("push")?;
        if !is_async {
            return top.push(context);
        }

        let mut frame = top.split();
        frame.push(context)?;
        self.push_frame(frame);
        Ok(())
    }

    /// Drop the head activation, discarding the top frame once it runs empty
    pub(crate) fn pop(&mut self) -> Result<(), ChainError> {
        self.top.active("pop")?.pop()?;
        if self.top.is_empty() {
            if let Some(frame) = self.below.pop() {
                self.top = Frame::Active(frame);
            }
        }
        Ok(())
    }

    pub(crate) fn delegate(&mut self, chain: Chain<C, T>) -> Result<(), ChainError> {
        self.top.active("delegate")?.delegate(chain);
        Ok(())
    }

    /// Detach the top frame into a new, independently driven stack
    pub(crate) fn split(&mut self) -> Result<Self, ChainError> {
        let chain = match &self.top {
            Frame::Active(frame) => frame.top_chain().clone(),
            Frame::Exhausted => return Err(ChainError::SplitEmptyStack),
        };

        let mut detached = Self::new(self.execution_id, chain, self.offset)?;
        let replacement = self
            .below
            .pop()
            .map(Frame::Active)
            .unwrap_or(Frame::Exhausted);

        if let Frame::Active(frame) = std::mem::replace(&mut self.top, replacement) {
            detached.push_frame(frame);
        }
        Ok(detached)
    }

    fn push_frame(&mut self, frame: StackFrame<C, T>) {
        if let Frame::Active(previous) = std::mem::replace(&mut self.top, Frame::Active(frame)) {
            self.below.push(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::ChainBuilder;
    use crate::domain::execution::activation::{Resume, Step};
    use crate::domain::execution::handler::Flow;
    use crate::domain::execution::invocation::Invocation;
    use crate::domain::execution::pending::MaybeAsync;

    fn chain(size: usize) -> Chain<i32, i32> {
        let mut builder = ChainBuilder::new("stack");
        for i in 0..size {
            builder = builder.append(format!("h{}", i), move |inv: Invocation<i32, i32>| {
                Flow::value(i as i32 * 100 + *inv.context())
            });
        }
        builder.build().unwrap()
    }

    fn stack(size: usize) -> ExecutionStack<i32, i32> {
        ExecutionStack::new(ExecutionId::next(), chain(size), 0).unwrap()
    }

    fn start_head(stack: &mut ExecutionStack<i32, i32>) -> i32 {
        match stack.head().unwrap().resume(Resume::Start).ok().unwrap() {
            Step::Return(MaybeAsync::Ready(value)) => value,
            _ => panic!("expected a returned value"),
        }
    }

    #[test]
    fn test_empty_chain_is_rejected() {
        let chain = ChainBuilder::<i32, i32>::new("empty").build().unwrap();
        let error = ExecutionStack::new(ExecutionId::next(), chain, 0).err().unwrap();
        assert_eq!(error.to_string(), "No handlers registered.");
    }

    #[test]
    fn test_new_stack_is_empty() {
        let mut stack = stack(1);
        assert!(stack.is_empty());
        assert!(stack.head().is_err());
    }

    #[test]
    fn test_push_and_pop() {
        let mut stack = stack(2);

        stack.push(1, false).unwrap();
        stack.push(2, false).unwrap();
        assert_eq!(start_head(&mut stack), 102);

        stack.pop().unwrap();
        assert_eq!(start_head(&mut stack), 1);

        stack.pop().unwrap();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_async_push_adds_frame() {
        let mut stack = stack(2);

        stack.push(1, false).unwrap();
        stack.push(2, true).unwrap();
        assert!(!stack.below.is_empty());
        assert_eq!(start_head(&mut stack), 102);

        // popping the only activation of the top frame exposes the frame beneath
        stack.pop().unwrap();
        assert!(stack.below.is_empty());
        assert_eq!(start_head(&mut stack), 1);
    }

    #[test]
    fn test_failed_async_push_leaves_stack_untouched() {
        let mut stack = stack(1);

        stack.push(1, false).unwrap();
        let error = stack.push(2, true).err().unwrap();
        assert_eq!(error.to_string(), "No further handlers registered.");
        assert!(stack.below.is_empty());
        assert_eq!(start_head(&mut stack), 1);
    }

    #[test]
    fn test_delegate_goes_to_top_frame() {
        let mut stack = stack(1);
        let other = chain(2);

        stack.push(1, false).unwrap();
        stack.delegate(other).unwrap();
        stack.push(5, false).unwrap();
        assert_eq!(start_head(&mut stack), 5);
    }

    #[test]
    fn test_split_detaches_top_frame() {
        let mut stack = stack(2);
        stack.push(1, false).unwrap();

        let mut detached = stack.split().unwrap();
        assert!(stack.is_empty());
        assert!(!detached.is_empty());
        assert_eq!(detached.execution_id(), stack.execution_id());
        assert_eq!(start_head(&mut detached), 1);

        detached.pop().unwrap();
        assert!(detached.is_empty());
    }

    #[test]
    fn test_split_exposes_frame_beneath() {
        let mut stack = stack(2);
        stack.push(1, false).unwrap();
        stack.push(2, true).unwrap();

        let mut detached = stack.split().unwrap();
        assert_eq!(start_head(&mut detached), 102);
        assert_eq!(start_head(&mut stack), 1);
    }

    #[test]
    fn test_exhausted_stack_rejects_operations() {
        let mut stack = stack(1);
        stack.push(1, false).unwrap();
        stack.split().unwrap();

        assert!(stack.is_empty());
        assert_eq!(
            stack.split().err().unwrap().to_string(),
            "Cannot split an empty execution stack"
        );
        assert_eq!(
            stack.push(1, false).err().unwrap().to_string(),
            "'push' operation not supported on empty stack frame"
        );
        assert_eq!(
            stack.pop().err().unwrap().to_string(),
            "'pop' operation not supported on empty stack frame"
        );
        assert_eq!(
            stack.delegate(chain(1)).err().unwrap().to_string(),
            "'delegate' operation not supported on empty stack frame"
        );
        assert_eq!(
            stack.head().err().unwrap().to_string(),
            "'head' operation not supported on empty stack frame"
        );
    }
}
