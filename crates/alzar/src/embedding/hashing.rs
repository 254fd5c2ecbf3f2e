use anyhow::Result;

use super::EmbeddingModel;

const TRIGRAM_WEIGHT: f32 = 0.5;

/// Offline embedding model based on signed feature hashing.
///
/// Each lower-cased word and each character trigram of a word is hashed into
/// one of `dimensions` buckets; the resulting vector is L2-normalized. Empty
/// text yields the zero vector.
pub struct HashingEmbeddingModel {
  dimensions: usize,
}

impl HashingEmbeddingModel {
  pub fn new(dimensions: usize) -> Self {
    Self { dimensions: dimensions.max(1) }
  }

  pub fn embed(&self, text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; self.dimensions];

    for token in tokenize(text) {
      self.add_feature(&mut vector, &token, 1.0);

      let padded: Vec<char> = format!("#{token}#").chars().collect();
      if padded.len() > 4 {
        for window in padded.windows(3) {
          let trigram: String = window.iter().collect();
          self.add_feature(&mut vector, &trigram, TRIGRAM_WEIGHT);
        }
      }
    }

    normalize_vector(&mut vector);
    vector
  }

  fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
    let hash = fnv1a_hash(feature.as_bytes());
    let index = (hash % self.dimensions as u64) as usize;
    let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
    vector[index] += sign * weight;
  }
}

impl EmbeddingModel for HashingEmbeddingModel {
  fn compute_embeddings(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    Ok(texts.iter().map(|text| self.embed(text)).collect())
  }

  fn version(&self) -> String {
    format!("hashing-{}", self.dimensions)
  }
}

fn tokenize(text: &str) -> Vec<String> {
  text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|word| !word.is_empty())
    .map(|word| word.to_lowercase())
    .collect()
}

fn normalize_vector(vector: &mut [f32]) {
  let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
  if magnitude > 0.0 {
    for value in vector.iter_mut() {
      *value /= magnitude;
    }
  }
}

fn fnv1a_hash(bytes: &[u8]) -> u64 {
  let mut hash = 0xcbf29ce484222325_u64;
  for byte in bytes {
    hash ^= *byte as u64;
    hash = hash.wrapping_mul(0x00000100000001b3_u64);
  }
  hash
}
