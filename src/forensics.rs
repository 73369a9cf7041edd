/*! Removed bots forensics.

Summarizes a `bots_removed.csv` trail: how many posts and accounts were removed,
and which account was the most prolific, with its posting rate.
!*/
use std::{collections::HashMap, fmt, path::Path};

use log::info;

use crate::{error::Error, io::writer::BotRow};

/// Most prolific account of a trail.
#[derive(Debug, Clone, PartialEq)]
pub struct TopOffender {
    pub author_id: String,
    pub posts: usize,
    /// Highest rate recorded for the account, in posts per day.
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotForensics {
    pub posts: usize,
    pub accounts: usize,
    pub top_offender: Option<TopOffender>,
    rate_ceiling: f64,
}

impl BotForensics {
    pub fn from_rows<I>(rows: I, rate_ceiling: f64) -> Self
    where
        I: IntoIterator<Item = BotRow>,
    {
        // author -> (posts, max rate)
        let mut authors: HashMap<String, (usize, f64)> = HashMap::new();
        let mut posts = 0;
        for row in rows {
            posts += 1;
            let entry = authors.entry(row.author_id).or_insert((0, f64::MIN));
            entry.0 += 1;
            entry.1 = entry.1.max(row.rate);
        }

        // ties are broken on author id to stay deterministic
        let top_offender = authors
            .iter()
            .max_by(|(a_id, (a_posts, _)), (b_id, (b_posts, _))| {
                a_posts.cmp(b_posts).then_with(|| b_id.cmp(a_id))
            })
            .map(|(author_id, (posts, rate))| TopOffender {
                author_id: author_id.clone(),
                posts: *posts,
                rate: *rate,
            });

        Self {
            posts,
            accounts: authors.len(),
            top_offender,
            rate_ceiling,
        }
    }

    pub fn from_path(path: &Path, rate_ceiling: f64) -> Result<Self, Error> {
        info!("inspecting {path:?}");
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<BotRow>, csv::Error>>()?;
        Ok(Self::from_rows(rows, rate_ceiling))
    }

    /// Whether the top offender posts faster than the ceiling.
    pub fn automated(&self) -> bool {
        self.top_offender
            .as_ref()
            .map_or(false, |top| top.rate > self.rate_ceiling)
    }
}

impl fmt::Display for BotForensics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "removed posts:    {}", self.posts)?;
        writeln!(f, "removed accounts: {}", self.accounts)?;
        if let Some(top) = &self.top_offender {
            writeln!(f, "top offender:     {}", top.author_id)?;
            writeln!(f, "  posts:          {}", top.posts)?;
            writeln!(f, "  rate:           {:.1} posts/day", top.rate)?;
            if self.automated() {
                writeln!(
                    f,
                    "  verdict:        likely automated (above {:.0} posts/day)",
                    self.rate_ceiling
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::io::writer::BotRow;

    use super::BotForensics;

    fn row(id: &str, author: &str, rate: f64) -> BotRow {
        BotRow {
            id: id.to_string(),
            author_id: author.to_string(),
            rate,
        }
    }

    #[test]
    fn summary() {
        let rows = vec![
            row("1", "b", 250.0),
            row("2", "b", 250.0),
            row("3", "c", 160.0),
        ];
        let f = BotForensics::from_rows(rows, 144.0);

        assert_eq!(f.posts, 3);
        assert_eq!(f.accounts, 2);
        let top = f.top_offender.as_ref().unwrap();
        assert_eq!(top.author_id, "b");
        assert_eq!(top.posts, 2);
        assert!(f.automated());
        assert!(f.to_string().contains("likely automated"));
    }

    #[test]
    fn empty_trail() {
        let f = BotForensics::from_rows(Vec::new(), 144.0);
        assert_eq!(f.posts, 0);
        assert!(f.top_offender.is_none());
        assert!(!f.automated());
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,author_id,rate").unwrap();
        writeln!(file, "1,b,100.0").unwrap();
        writeln!(file, "2,b,100.0").unwrap();

        let f = BotForensics::from_path(file.path(), 144.0).unwrap();
        assert_eq!(f.posts, 2);
        assert!(!f.automated());
    }
}
