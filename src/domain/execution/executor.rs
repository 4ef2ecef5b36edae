//! Chain executor - the driver loop over an execution stack

use tracing::{debug, trace};

use crate::domain::chain::Chain;
use crate::domain::ChainError;

use super::activation::{Resume, Step};
use super::handler::RequestKind;
use super::id::ExecutionId;
use super::pending::MaybeAsync;
use super::stack::ExecutionStack;

/// Run `chain` from `offset` with `context` under an existing execution identity
pub(crate) fn execute<C, T>(
    execution_id: ExecutionId,
    chain: Chain<C, T>,
    offset: usize,
    context: C,
) -> Result<MaybeAsync<T>, ChainError>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    debug!(
        execution_id = %execution_id,
        chain = %chain.id(),
        offset,
        "Executing chain"
    );

    let stack = ExecutionStack::new(execution_id, chain, offset)?;
    ChainExecutor::new(stack).run(context)
}

enum Status<T> {
    /// Start the head activation
    Entering,
    /// Resume the head activation with a result
    Returning(MaybeAsync<T>),
    /// Inject an error into the head activation
    Throwing(ChainError),
}

struct ChainExecutor<C, T> {
    stack: ExecutionStack<C, T>,
    status: Status<T>,
}

impl<C, T> ChainExecutor<C, T>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    fn new(stack: ExecutionStack<C, T>) -> Self {
        Self {
            stack,
            status: Status::Entering,
        }
    }

    fn run(mut self, context: C) -> Result<MaybeAsync<T>, ChainError> {
        self.stack.push(context, false)?;
        self.drive()
    }

    fn drive(mut self) -> Result<MaybeAsync<T>, ChainError> {
        while !self.stack.is_empty() {
            if let Err(error) = self.advance() {
                trace!(
                    execution_id = %self.stack.execution_id(),
                    error = %error,
                    "Unwinding handler"
                );
                self.status = Status::Throwing(error);
                self.stack.pop()?;
            }
        }
        self.finish()
    }

    fn advance(&mut self) -> Result<(), ChainError> {
        match self.step()? {
            Step::Return(MaybeAsync::Ready(value)) => {
                self.status = Status::Returning(MaybeAsync::Ready(value));
                self.stack.pop()?;
            }
            Step::Return(pending) => {
                // the activation is popped by the continuation once the value settles
                let continuation = self.schedule_return(pending)?;
                self.status = Status::Returning(continuation);
            }
            Step::Yield(request) => {
                let (kind, context, is_async) = request.into_parts();
                match context {
                    MaybeAsync::Ready(context) => self.enter(kind, context, is_async),
                    pending => {
                        let continuation = self.schedule_enter(kind, pending, is_async)?;
                        self.status = Status::Returning(continuation);
                    }
                }
            }
        }
        Ok(())
    }

    fn step(&mut self) -> Result<Step<C, T>, ChainError> {
        let input = match std::mem::replace(&mut self.status, Status::Entering) {
            Status::Entering => Resume::Start,
            Status::Returning(value) => Resume::Value(value),
            Status::Throwing(error) => Resume::Error(error),
        };

        let execution_id = self.stack_id();
        let head = self.stack.head()?;
        trace!(
            execution_id = %execution_id,
            handler = %head.name(),
            "Stepping handler"
        );
        head.resume(input)
    }

    /// Answer a control request whose context is available
    ///
    /// A request that cannot be answered fails at its own yield point, so the
    /// handler that issued it sees the error first.
    fn enter(&mut self, kind: RequestKind<C, T>, context: C, is_async: bool) {
        let entered = match kind {
            RequestKind::Delegate(chain) => self
                .stack
                .delegate(chain)
                .and_then(|()| self.stack.push(context, is_async)),
            RequestKind::Proceed => self.stack.push(context, is_async),
        };

        self.status = match entered {
            Ok(()) => Status::Entering,
            Err(error) => Status::Throwing(error),
        };
    }

    fn schedule_enter(
        &mut self,
        kind: RequestKind<C, T>,
        context: MaybeAsync<C>,
        is_async: bool,
    ) -> Result<MaybeAsync<T>, ChainError> {
        let executor = self.fork_off("context")?;

        Ok(MaybeAsync::continuation(async move {
            match context.settle().await {
                Ok(context) => executor.resume_enter(kind, context, is_async),
                Err(error) => executor.resume_throw(error),
            }
        }))
    }

    fn schedule_return(&mut self, value: MaybeAsync<T>) -> Result<MaybeAsync<T>, ChainError> {
        let executor = self.fork_off("result")?;

        Ok(MaybeAsync::continuation(async move {
            match value.settle().await {
                Ok(value) => executor.resume_return(value),
                Err(error) => executor.resume_throw(error),
            }
        }))
    }

    /// Split the top frame into a new executor that continues once `awaiting` settles
    fn fork_off(&mut self, awaiting: &'static str) -> Result<Self, ChainError> {
        let stack = self.stack.split()?;
        debug!(
            execution_id = %stack.execution_id(),
            awaiting,
            "Scheduling asynchronous continuation"
        );
        Ok(Self::new(stack))
    }

    fn resume_enter(
        mut self,
        kind: RequestKind<C, T>,
        context: C,
        is_async: bool,
    ) -> Result<MaybeAsync<T>, ChainError> {
        self.enter(kind, context, is_async);
        self.drive()
    }

    fn resume_return(mut self, value: T) -> Result<MaybeAsync<T>, ChainError> {
        self.status = Status::Returning(MaybeAsync::Ready(value));
        self.stack.pop()?;
        self.drive()
    }

    fn resume_throw(mut self, error: ChainError) -> Result<MaybeAsync<T>, ChainError> {
        self.status = Status::Throwing(error);
        self.drive()
    }

    fn finish(self) -> Result<MaybeAsync<T>, ChainError> {
        let execution_id = self.stack_id();
        match self.status {
            Status::Returning(value) => {
                debug!(
                    execution_id = %execution_id,
                    pending = value.is_pending(),
                    "Execution settled"
                );
                Ok(value)
            }
            Status::Throwing(error) => {
                debug!(execution_id = %execution_id, error = %error, "Execution failed");
                Err(error)
            }
            Status::Entering => Err(ChainError::Incomplete),
        }
    }

    fn stack_id(&self) -> ExecutionId {
        self.stack.execution_id()
    }
}
