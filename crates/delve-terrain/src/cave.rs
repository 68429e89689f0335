//! Reference cave generator: solid rock carved by multi-octave 3D simplex
//! noise, sealed by rough bedrock at the floor and the ceiling.

use delve_voxel::{CHUNK_HEIGHT, CHUNK_WIDTH, Chunk, ChunkBuilder, ChunkPos, GenerationError, VoxelGenerator};
use noise::{NoiseFn, Simplex};
use rand::Rng;

use crate::seed::{chunk_rng, noise_seed};

/// Configuration for noise-based cave generation.
#[derive(Clone, Debug)]
pub struct CaveConfig {
    /// Voxels where the normalized noise is above this value are solid.
    /// Higher thresholds carve more air. Typical range: -0.3 to 0.3.
    /// Default: 0.1.
    pub threshold: f64,
    /// Number of noise octaves. Default: 3.
    pub octaves: u32,
    /// Base frequency of the cave noise. Default: 0.03.
    pub frequency: f64,
    /// Lacunarity (frequency multiplier per octave). Default: 2.0.
    pub lacunarity: f64,
    /// Persistence (amplitude multiplier per octave). Default: 0.5.
    pub persistence: f64,
    /// Vertical frequency multiplier; values above 1 flatten caves into
    /// wider horizontal galleries. Default: 1.5.
    pub vertical_scale: f64,
    /// Thickness of the rough bedrock band at the floor and the ceiling.
    /// The outermost layer is always solid. Default: 4.
    pub bedrock_layers: usize,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            octaves: 3,
            frequency: 0.03,
            lacunarity: 2.0,
            persistence: 0.5,
            vertical_scale: 1.5,
            bedrock_layers: 4,
        }
    }
}

/// Deterministic [`VoxelGenerator`] producing cave terrain.
#[derive(Clone, Debug, Default)]
pub struct CaveGenerator {
    config: CaveConfig,
}

impl CaveGenerator {
    pub fn new(config: CaveConfig) -> Self {
        Self { config }
    }

    /// Returns the cave configuration.
    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Sample multi-octave cave noise at a world position, normalized to [-1, 1].
    fn sample(&self, noise: &Simplex, x: f64, y: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.config.frequency;
        let mut amplitude = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..self.config.octaves {
            let val = noise.get([
                x * frequency,
                y * frequency * self.config.vertical_scale,
                z * frequency,
            ]);
            total += val * amplitude;
            max_amplitude += amplitude;

            frequency *= self.config.lacunarity;
            amplitude *= self.config.persistence;
        }

        if max_amplitude > 0.0 { total / max_amplitude } else { 0.0 }
    }
}

impl VoxelGenerator for CaveGenerator {
    fn generate(&self, pos: ChunkPos, seed: u64) -> Result<Chunk, GenerationError> {
        let noise = Simplex::new(noise_seed(seed));
        let mut rng = chunk_rng(seed, &pos);
        let origin = pos.origin();
        let bedrock = self.config.bedrock_layers.min(CHUNK_HEIGHT / 2);

        let mut builder = ChunkBuilder::new();
        if bedrock > 0 {
            builder
                .fill_box([0, 0, 0], [CHUNK_WIDTH, 1, CHUNK_WIDTH], true)
                .fill_box([0, CHUNK_HEIGHT - 1, 0], [CHUNK_WIDTH, CHUNK_HEIGHT, CHUNK_WIDTH], true);
        }
        for z in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_WIDTH {
                let wx = f64::from(origin.x) + x as f64;
                let wz = f64::from(origin.z) + z as f64;

                for y in 0..CHUNK_HEIGHT {
                    let depth_from_edge = y.min(CHUNK_HEIGHT - 1 - y);
                    if bedrock > 0 && depth_from_edge == 0 {
                        continue;
                    }
                    let solid = if depth_from_edge < bedrock {
                        // Inner bedrock layers thin out away from the seal.
                        rng.random_range(0..bedrock) >= depth_from_edge
                    } else {
                        self.sample(&noise, wx, y as f64, wz) > self.config.threshold
                    };
                    if solid {
                        builder.set_solid(x, y, z, true);
                    }
                }
            }
        }

        Ok(builder.build())
    }
}
