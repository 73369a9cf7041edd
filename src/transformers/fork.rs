//! Heavy/light fork.
use log::info;
use rayon::prelude::*;

use crate::{config::PipelineConfig, error::Error, record::ScrubbedRecord};

use super::{HeavyNormalizer, HeavyRecord, LightNormalizer, LightRecord, Transform};

/// Both output corpora, holding the same ids in the same order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ForkedCorpora {
    pub heavy: Vec<HeavyRecord>,
    pub light: Vec<LightRecord>,
}

/// Runs both normalizations over the same scrubbed set.
///
/// The two paths only read the scrubbed records and run concurrently.
pub struct OutputForker {
    heavy: HeavyNormalizer,
    light: LightNormalizer,
}

impl OutputForker {
    pub fn new(heavy: HeavyNormalizer, light: LightNormalizer) -> Self {
        Self { heavy, light }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, Error> {
        Ok(Self::new(
            HeavyNormalizer::from_config(&config.heavy)?,
            LightNormalizer::new(config.light.clone()),
        ))
    }

    pub fn fork(&self, records: &[ScrubbedRecord]) -> Result<ForkedCorpora, Error> {
        info!("[fork] normalizing {} records", records.len());

        let (heavy, light): (Vec<HeavyRecord>, Vec<LightRecord>) = rayon::join(
            || records.par_iter().map(|r| self.heavy.transform(r)).collect(),
            || records.par_iter().map(|r| self.light.transform(r)).collect(),
        );

        let aligned = heavy.len() == light.len()
            && heavy.iter().zip(&light).all(|(h, l)| h.id == l.id);
        if !aligned {
            return Err(Error::Custom(
                "heavy and light outputs do not hold the same ids".to_string(),
            ));
        }

        let empty = heavy.iter().filter(|h| h.tokens.is_empty()).count();
        if empty > 0 {
            info!("[fork] {empty} records have no heavy token left");
        }

        Ok(ForkedCorpora { heavy, light })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::PipelineConfig,
        filtering::tests::record,
        record::ScrubbedRecord,
    };

    use super::OutputForker;

    #[test]
    fn same_ids_same_order() {
        let records: Vec<ScrubbedRecord> = (0..100)
            .map(|i| {
                let r = record(&i.to_string(), "a", "x", i);
                ScrubbedRecord::new(r, format!("economy plan number {i}\n"), 0)
            })
            .collect();

        let forker = OutputForker::from_config(&PipelineConfig::default()).unwrap();
        let corpora = forker.fork(&records).unwrap();

        let heavy_ids: Vec<_> = corpora.heavy.iter().map(|h| h.id.as_str()).collect();
        let light_ids: Vec<_> = corpora.light.iter().map(|l| l.id.as_str()).collect();
        let input_ids: Vec<_> = records.iter().map(|r| r.id()).collect();
        assert_eq!(heavy_ids, input_ids);
        assert_eq!(light_ids, input_ids);

        assert_eq!(corpora.heavy[7].tokens, vec!["economy", "plan", "number"]);
        assert_eq!(corpora.light[7].text, "economy plan number 7");
    }

    #[test]
    fn empty_input() {
        let forker = OutputForker::from_config(&PipelineConfig::default()).unwrap();
        let corpora = forker.fork(&[]).unwrap();
        assert!(corpora.heavy.is_empty());
        assert!(corpora.light.is_empty());
    }
}
