use std::fmt;

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Raw bytes of a photo the user picked, exactly as the platform handed them over.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickedImage {
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl fmt::Debug for PickedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickedImage")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickerOperation {
    PickImage,
}

impl Operation for PickerOperation {
    /// `None` when the user backed out of the picker.
    type Output = Option<PickedImage>;
}

pub struct Picker<Ev> {
    context: CapabilityContext<PickerOperation, Ev>,
}

impl<Ev> Clone for Picker<Ev> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<Ev> Capability<Ev> for Picker<Ev> {
    type Operation = PickerOperation;
    type MappedSelf<MappedEv> = Picker<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Picker::new(self.context.map_event(f))
    }
}

impl<Ev> Picker<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<PickerOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn pick_image<F>(&self, make_event: F)
    where
        F: FnOnce(Option<PickedImage>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let picked = ctx.request_from_shell(PickerOperation::PickImage).await;
            ctx.update_app(make_event(picked));
        });
    }
}
