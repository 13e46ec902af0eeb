use chatflow_forms::{Handler, Outcome, Processor};
use tracing::debug;

use crate::context::SessionContext;
use crate::state::{Reply, Transition};

/// Object-safe view of a handler plus its routing.
trait Flow: Send {
    fn process_message(&mut self, ctx: &mut SessionContext, text: &str) -> Reply;
    fn default_response(&self) -> String;
}

struct Routed<P, N, X>
where
    P: Processor,
{
    handler: Handler<P, SessionContext>,
    next: N,
    exit: X,
}

impl<P, N, X> Flow for Routed<P, N, X>
where
    P: Processor,
    N: FnMut(&mut SessionContext, P::Output) -> Transition + Send,
    X: FnMut(&mut SessionContext) -> Transition + Send,
{
    fn process_message(&mut self, ctx: &mut SessionContext, text: &str) -> Reply {
        match self.handler.process_input(ctx, text) {
            Outcome::Success(value) => {
                debug!(principal = %ctx.id, "pipeline completed");
                (self.next)(ctx, value).into_reply(|| self.handler.default_response())
            }
            Outcome::Retry(message) => Reply::Stay(message),
            Outcome::Cancel => {
                debug!(principal = %ctx.id, "pipeline cancelled");
                (self.exit)(ctx).into_reply(|| self.handler.default_response())
            }
        }
    }

    fn default_response(&self) -> String {
        self.handler.default_response()
    }
}

/// A state backed by a processor [`Handler`].
///
/// `Retry` keeps the session here with the retry text as the reply. A
/// committed `Success` goes through `next` and `Cancel` through `exit`;
/// both decide the following state. If either returns [`Transition::stay`],
/// the handler has already been reset and the user starts the pipeline over.
pub struct PipelineState {
    flow: Box<dyn Flow>,
}

impl PipelineState {
    pub fn new<P, N, X>(handler: Handler<P, SessionContext>, next: N, exit: X) -> Self
    where
        P: Processor + 'static,
        N: FnMut(&mut SessionContext, P::Output) -> Transition + Send + 'static,
        X: FnMut(&mut SessionContext) -> Transition + Send + 'static,
    {
        Self {
            flow: Box::new(Routed {
                handler,
                next,
                exit,
            }),
        }
    }

    /// A pipeline without a commit step.
    pub fn from_processor<P, N, X>(processor: P, next: N, exit: X) -> Self
    where
        P: Processor + 'static,
        N: FnMut(&mut SessionContext, P::Output) -> Transition + Send + 'static,
        X: FnMut(&mut SessionContext) -> Transition + Send + 'static,
    {
        Self::new(Handler::infallible(processor), next, exit)
    }

    pub fn process_message(&mut self, ctx: &mut SessionContext, text: &str) -> Reply {
        self.flow.process_message(ctx, text)
    }

    pub fn default_response(&self) -> String {
        self.flow.default_response()
    }
}
