/// Calculate cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() {
    return 0.0;
  }

  let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
  let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
  let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

  if magnitude_a == 0.0 || magnitude_b == 0.0 {
    0.0
  } else {
    dot_product / (magnitude_a * magnitude_b)
  }
}

/// Element-wise arithmetic mean of equally sized vectors.
/// Returns `None` for an empty input or mismatched dimensions.
pub fn mean_vector(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
  let first = vectors.first()?;
  let dimensions = first.len();

  if vectors.iter().any(|v| v.len() != dimensions) {
    return None;
  }

  let mut sum = vec![0.0f32; dimensions];
  for vector in vectors {
    for (acc, value) in sum.iter_mut().zip(vector) {
      *acc += value;
    }
  }

  let count = vectors.len() as f32;
  Some(sum.into_iter().map(|v| v / count).collect())
}
