/*! Record transformers.

[EntityScrubber] removes target entities from the texts that survived filtering,
then [OutputForker] derives the two output corpora from the scrubbed records:

- [HeavyNormalizer]: lemmatized, stopword-free token lists,
- [LightNormalizer]: whitespace-normalized natural text.

!*/

mod fork;
mod heavy;
mod lemmatizer;
mod light;
mod scrubber;
mod stopwords;
mod transform;

pub use fork::{ForkedCorpora, OutputForker};
pub use heavy::{HeavyNormalizer, HeavyRecord};
pub use lemmatizer::Lemmatizer;
pub use light::{LightNormalizer, LightRecord};
pub use scrubber::EntityScrubber;
pub use stopwords::Stopwords;
pub use transform::Transform;
