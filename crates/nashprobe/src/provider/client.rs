//! Provider wrapper that turns every reply into a [`NormalizedReply`].

use anyhow::Context as _;

use super::{Prompt, Provider};
use crate::model::NormalizedReply;
use crate::normalize::normalize;

/// Calls one provider and normalizes its replies.
///
/// Transport failures propagate; unparseable text never does.
pub struct ReplyClient<P> {
    provider: P,
}

impl<P: Provider> ReplyClient<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Send one prompt and normalize the reply.
    pub async fn ask(&self, prompt: &Prompt) -> anyhow::Result<NormalizedReply> {
        let id = self.provider.id();
        tracing::debug!(
            "calling {} (system chars={}, user chars={})",
            id,
            prompt.system.len(),
            prompt.user.len()
        );
        let raw = self
            .provider
            .complete(prompt)
            .await
            .with_context(|| format!("{} request failed", id))?;
        let reply = normalize(&raw);
        if reply.is_fallback() {
            tracing::warn!(
                "{} reply did not parse as JSON (chars={}); kept as raw_output",
                id,
                raw.len()
            );
        } else {
            tracing::debug!(
                "{} reply parsed via {:?} (keys={})",
                id,
                reply.origin(),
                reply.fields().len()
            );
        }
        Ok(reply)
    }

    /// Send prompts one after another; stops at the first transport error.
    pub async fn ask_all(&self, prompts: &[Prompt]) -> anyhow::Result<Vec<NormalizedReply>> {
        let mut out = Vec::with_capacity(prompts.len());
        for (idx, prompt) in prompts.iter().enumerate() {
            let reply = self
                .ask(prompt)
                .await
                .with_context(|| format!("prompt #{idx}"))?;
            out.push(reply);
        }
        let fallbacks = out.iter().filter(|r| r.is_fallback()).count();
        tracing::info!(
            "{}: {} replies ({} unparsed)",
            self.provider.id(),
            out.len(),
            fallbacks
        );
        Ok(out)
    }
}
