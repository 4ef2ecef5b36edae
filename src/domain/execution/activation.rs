//! A live handler computation owned by a stack frame

use std::sync::Arc;

use crate::domain::ChainError;

use super::handler::{Continuation, Flow, HandlerRef, Request};
use super::invocation::Invocation;
use super::pending::MaybeAsync;

/// How the executor resumes an activation
pub(crate) enum Resume<T> {
    /// First step; runs the handler body
    Start,
    /// Resume with a produced result
    Value(MaybeAsync<T>),
    /// Inject an error at the suspension point
    Error(ChainError),
}

/// What an activation did when stepped
pub(crate) enum Step<C, T> {
    Yield(Request<C, T>),
    Return(MaybeAsync<T>),
}

enum State<C, T> {
    Unstarted {
        handler: HandlerRef<C, T>,
        invocation: Invocation<C, T>,
    },
    Suspended(Continuation<C, T>),
    Completed,
}

pub(crate) struct Activation<C, T> {
    name: Arc<str>,
    state: State<C, T>,
}

impl<C, T> Activation<C, T>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    /// Bind a handler to its invocation without running it
    pub(crate) fn new(name: Arc<str>, handler: HandlerRef<C, T>, invocation: Invocation<C, T>) -> Self {
        Self {
            name,
            state: State::Unstarted {
                handler,
                invocation,
            },
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn resume(&mut self, input: Resume<T>) -> Result<Step<C, T>, ChainError> {
        let flow = match (std::mem::replace(&mut self.state, State::Completed), input) {
            (
                State::Unstarted {
                    handler,
                    invocation,
                },
                Resume::Start,
            ) => handler.handle(invocation),
            (State::Suspended(continuation), Resume::Value(value)) => continuation(Ok(value)),
            (State::Suspended(continuation), Resume::Error(error)) => continuation(Err(error)),
            // an error injected before the first step or after completion is re-raised as is
            (_, Resume::Error(error)) => return Err(error),
            (state, input) => {
                let description = format!("{} on {} handler '{}'", input.describe(), state.describe(), self.name);
                self.state = state;
                return Err(ChainError::unsupported_yield(description));
            }
        };

        match flow {
            Flow::Return(value) => Ok(Step::Return(value)),
            Flow::Throw(error) => Err(error),
            Flow::Yield(request, continuation) => {
                self.state = State::Suspended(continuation);
                Ok(Step::Yield(request))
            }
        }
    }
}

impl<T> Resume<T> {
    fn describe(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Value(_) => "resume",
            Self::Error(_) => "throw",
        }
    }
}

impl<C, T> State<C, T> {
    fn describe(&self) -> &'static str {
        match self {
            Self::Unstarted { .. } => "unstarted",
            Self::Suspended(_) => "suspended",
            Self::Completed => "completed",
        }
    }
}
