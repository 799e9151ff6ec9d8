use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Text handed to the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareOperation {
    pub title: String,
    pub text: String,
    pub url: Option<String>,
}

impl Operation for ShareOperation {
    type Output = ();
}

pub struct Share<Ev> {
    context: CapabilityContext<ShareOperation, Ev>,
}

impl<Ev> Clone for Share<Ev> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<Ev> Capability<Ev> for Share<Ev> {
    type Operation = ShareOperation;
    type MappedSelf<MappedEv> = Share<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Share::new(self.context.map_event(f))
    }
}

impl<Ev> Share<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<ShareOperation, Ev>) -> Self {
        Self { context }
    }

    /// Fire and forget: the core never learns whether the user shared.
    pub fn share(&self, operation: ShareOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}
