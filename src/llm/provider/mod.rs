//! Provider codecs and factory
//!
//! Each submodule translates the neutral history into one vendor's wire
//! format. The conversation loop picks a codec by [`ProviderKind`].

pub mod anthropic;
pub mod gemini;
pub mod openai;

use crate::core::ProviderKind;
use crate::llm::traits::ProviderCodec;

pub use self::anthropic::AnthropicCodec;
pub use self::gemini::GeminiCodec;
pub use self::openai::OpenAiCodec;

/// Create the codec for a provider family
pub fn codec_for(kind: ProviderKind) -> Box<dyn ProviderCodec> {
    match kind {
        ProviderKind::OpenAi => Box::new(OpenAiCodec::new()),
        ProviderKind::Anthropic => Box::new(AnthropicCodec::new()),
        ProviderKind::Gemini => Box::new(GeminiCodec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_for_matches_kind() {
        for kind in [ProviderKind::OpenAi, ProviderKind::Anthropic, ProviderKind::Gemini] {
            assert_eq!(codec_for(kind).kind(), kind);
        }
    }
}
