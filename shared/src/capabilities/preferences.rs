use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::model::HomePreferences;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferencesOperation {
    Load,
    Save(HomePreferences),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferencesOutput {
    /// `None` on first launch.
    Loaded(Option<HomePreferences>),
    Saved,
}

impl Operation for PreferencesOperation {
    type Output = PreferencesOutput;
}

pub struct Preferences<Ev> {
    context: CapabilityContext<PreferencesOperation, Ev>,
}

impl<Ev> Clone for Preferences<Ev> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<Ev> Capability<Ev> for Preferences<Ev> {
    type Operation = PreferencesOperation;
    type MappedSelf<MappedEv> = Preferences<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Preferences::new(self.context.map_event(f))
    }
}

impl<Ev> Preferences<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<PreferencesOperation, Ev>) -> Self {
        Self { context }
    }

    /// Missing or unreadable preferences come back as the defaults.
    pub fn load<F>(&self, make_event: F)
    where
        F: FnOnce(HomePreferences) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let prefs = match ctx.request_from_shell(PreferencesOperation::Load).await {
                PreferencesOutput::Loaded(prefs) => prefs.unwrap_or_default(),
                PreferencesOutput::Saved => HomePreferences::default(),
            };
            ctx.update_app(make_event(prefs));
        });
    }

    pub fn save(&self, prefs: HomePreferences) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.request_from_shell(PreferencesOperation::Save(prefs)).await;
        });
    }
}
