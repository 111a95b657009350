//! Latent interpolation between the four corner embeddings.

use beatpad_spec::{BlendError, BlendWeights, CornerLabel, Embedding, EncodingSet, Pattern, Point};

use crate::model::ModelService;

/// Computes `wA*zA + wB*zB + wC*zC + wD*zD` component-wise.
///
/// Fails with [`BlendError::DimensionMismatch`] naming the first corner whose
/// embedding disagrees with corner A.
pub fn interpolate(set: &EncodingSet, weights: &BlendWeights) -> Result<Embedding, BlendError> {
    let expected = set.get(CornerLabel::A).dim();
    for label in CornerLabel::ALL {
        let got = set.get(label).dim();
        if got != expected {
            return Err(BlendError::DimensionMismatch {
                corner: label,
                expected,
                got,
            });
        }
    }

    let mut out = vec![0.0; expected];
    for label in CornerLabel::ALL {
        let w = weights.get(label);
        for (acc, v) in out.iter_mut().zip(set.get(label).as_slice()) {
            *acc += w * v;
        }
    }
    Ok(Embedding::new(out))
}

/// Interpolates at `point` and decodes the result, bypassing any cache.
pub async fn decode_at(
    model: &dyn ModelService,
    set: &EncodingSet,
    point: Point,
    temperature: f64,
) -> Result<Pattern, BlendError> {
    let z = interpolate(set, &BlendWeights::at(point))?;
    if !model.is_ready() {
        return Err(BlendError::ModelUnavailable("model is not loaded".to_string()));
    }
    model
        .decode(z, temperature)
        .await
        .map_err(BlendError::from_decode)
}
