pub mod gemini;
pub mod openai;

use futures::future::BoxFuture;

use vireo_core::error::Result;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// A single-model completion backend. The fallback layer sits on top and
/// handles candidate iteration.
pub trait Completion: Send + Sync + 'static {
    /// Provider name reported in turn metadata.
    fn name(&self) -> &str;

    /// One completion attempt against one concrete model.
    fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        user_message: &str,
        temperature: f32,
    ) -> BoxFuture<'_, Result<String>>;
}
