use std::collections::HashMap;
use std::fmt::{self, Display};
use std::io::BufRead;
use std::path::Path;

use crate::errors::CatalogError;
use crate::utils::get_dynamic_reader;

///
/// One chromosome of a genome assembly, identified by its ordinal index.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct Chromosome {
    pub index: usize,
    pub name: String,
    pub length: u32,
}

impl Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.name, self.length)
    }
}

/// Lookup of chromosome lengths by ordinal index.
///
/// This is everything the binning engine knows about a genome. Indices are
/// dense: a catalog with `count() == n` answers `get(i)` for every `i < n`.
pub trait ChromosomeCatalog: Send + Sync {
    fn count(&self) -> usize;

    fn get(&self, index: usize) -> Option<&Chromosome>;

    fn index_of(&self, name: &str) -> Option<usize> {
        (0..self.count()).find(|&i| self.get(i).is_some_and(|chr| chr.name == name))
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Chromosome> + '_> {
        Box::new((0..self.count()).filter_map(move |i| self.get(i)))
    }
}

///
/// In-memory chromosome catalog. Ordinal indices follow insertion order.
///
#[derive(Clone, Debug, Default)]
pub struct Genome {
    chromosomes: Vec<Chromosome>,
    by_name: HashMap<String, usize>,
}

impl Genome {
    ///
    /// Build a catalog from `(name, length)` pairs.
    ///
    /// # Arguments
    /// - entries: chromosomes in the order that defines their index
    pub fn new(entries: Vec<(String, u32)>) -> Result<Self, CatalogError> {
        let mut chromosomes = Vec::with_capacity(entries.len());
        let mut by_name = HashMap::with_capacity(entries.len());

        for (index, (name, length)) in entries.into_iter().enumerate() {
            if by_name.insert(name.clone(), index).is_some() {
                return Err(CatalogError::DuplicateChromosome(name));
            }
            chromosomes.push(Chromosome {
                index,
                name,
                length,
            });
        }

        Ok(Genome {
            chromosomes,
            by_name,
        })
    }

    ///
    /// Read a `chrom.sizes` file (name and length per line, whitespace separated).
    /// Gzipped files are detected by their `.gz` extension.
    ///
    pub fn from_chrom_sizes<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let reader = get_dynamic_reader(path)
            .map_err(|e| CatalogError::FileReadError(format!("{}: {}", path.display(), e)))?;

        let mut entries = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut fields = trimmed.split_whitespace();
            let name = fields.next().ok_or_else(|| CatalogError::ParseError {
                line: line_num + 1,
                reason: "missing chromosome name".to_string(),
            })?;
            let length = fields
                .next()
                .ok_or_else(|| CatalogError::ParseError {
                    line: line_num + 1,
                    reason: "missing chromosome length".to_string(),
                })?
                .parse::<u32>()
                .map_err(|e| CatalogError::ParseError {
                    line: line_num + 1,
                    reason: e.to_string(),
                })?;

            entries.push((name.to_string(), length));
        }

        if entries.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        Genome::new(entries)
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// Sum of all chromosome lengths.
    pub fn genome_length(&self) -> u64 {
        self.chromosomes.iter().map(|chr| chr.length as u64).sum()
    }
}

impl ChromosomeCatalog for Genome {
    fn count(&self) -> usize {
        self.chromosomes.len()
    }

    fn get(&self, index: usize) -> Option<&Chromosome> {
        self.chromosomes.get(index)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Chromosome> + '_> {
        Box::new(self.chromosomes.iter())
    }
}
