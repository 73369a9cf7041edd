/*! Language identification models

Holds an [Identifier] trait for implementing other ones.

The current identifier used is [fasttext](https://fasttext.cc) !*/
mod identification;
mod model;
mod tag_convert;

pub use identification::{Identification, Identifier};
pub use model::FastText;
pub use tag_convert::{label_to_tag, same_language};
