//! Materials, surface colors, and the BRDF sampling the integrator calls
//! into when it shades a hit.
use crate::math::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Linear RGB radiance/reflectance triple.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

impl Color {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b }
    }

    pub fn scale(self, s: f64) -> Color {
        Color::new(self.r * s, self.g * s, self.b * s)
    }

    pub fn add(self, o: Color) -> Color {
        Color::new(self.r + o.r, self.g + o.g, self.b + o.b)
    }

    pub fn mul(self, o: Color) -> Color {
        Color::new(self.r * o.r, self.g * o.g, self.b * o.b)
    }

    pub fn luminance(self) -> f64 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

/// Tagged union of the materials a `Thing` can be painted with. Geometry
/// never depends on this; only BRDF sampling in `integrator` does.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Material {
    Metal { color: Color, roughness: f64 },
    Matte { color: Color },
    Glass { color: Color, ior: f64 },
    Light { emission: Color },
}

impl Material {
    pub fn metal(color: Color, roughness: f64) -> Material {
        Material::Metal { color, roughness: roughness.max(0.0).min(1.0) }
    }

    pub fn matte(color: Color) -> Material {
        Material::Matte { color }
    }

    pub fn glass(color: Color, ior: f64) -> Material {
        Material::Glass { color, ior }
    }

    pub fn light(emission: Color) -> Material {
        Material::Light { emission }
    }

    pub fn emission(&self) -> Color {
        match self {
            Material::Light { emission } => *emission,
            _ => BLACK,
        }
    }
}

/// Result of sampling a bounce direction off a material: the new ray
/// direction and the throughput multiplier it carries.
pub struct Bounce {
    pub direction: Vec3,
    pub attenuation: Color,
    /// Whether this bounce passed through the surface (refraction) rather
    /// than reflecting off it; the integrator uses this to decide whether a
    /// shadow ray should be cast from this vertex at all.
    pub transmitted: bool,
}

/// Samples a direction in the hemisphere around `normal`, weighted by
/// cosine with the normal (the importance-sampled distribution for a
/// Lambertian BRDF, so the throughput term it implies is just the surface
/// color with no extra cosine/pdf factor).
pub fn cosine_weighted_hemisphere(normal: Vec3, rng: &mut impl Rng) -> Vec3 {
    let u1: f64 = rng.gen();
    let u2: f64 = rng.gen();
    let r = u1.sqrt();
    let theta = 2.0 * std::f64::consts::PI * u2;
    let x = r * theta.cos();
    let y = r * theta.sin();
    let z = (1.0 - u1).max(0.0).sqrt();

    let (t, b) = orthonormal_basis(normal);
    t.scale(x).add(b.scale(y)).add(normal.scale(z))
}

/// Picks an arbitrary orthonormal basis `(tangent, bitangent)` for the
/// plane perpendicular to `normal`.
pub(crate) fn orthonormal_basis(normal: Vec3) -> (Vec3, Vec3) {
    let sign = if normal.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + normal.z);
    let b = normal.x * normal.y * a;
    let tangent = Vec3::new(1.0 + sign * normal.x * normal.x * a, sign * b, -sign * normal.x);
    let bitangent = Vec3::new(b, sign + normal.y * normal.y * a, -normal.y);
    (tangent, bitangent)
}

/// A reflection direction perturbed by `roughness`, by mixing in a
/// cosine-weighted sample around the perfect mirror direction.
fn rough_reflect(incoming: Vec3, normal: Vec3, roughness: f64, rng: &mut impl Rng) -> Vec3 {
    let mirror = incoming.reflect(normal);
    if roughness <= 0.0 {
        return mirror;
    }
    let fuzz = cosine_weighted_hemisphere(normal, rng).scale(roughness);
    mirror.add(fuzz).unit()
}

/// Schlick's approximation to the Fresnel reflectance at normal incidence
/// ratio `cos_theta`, for an interface with the given index-of-refraction
/// ratio `eta`.
fn schlick_fresnel(cos_theta: f64, eta: f64) -> f64 {
    let r0 = ((1.0 - eta) / (1.0 + eta)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cos_theta).powi(5)
}

/// Samples the next bounce direction for `material`, given the incoming
/// ray direction and the surface normal (always oriented to face the
/// incoming ray, i.e. `normal.dot(incoming) <= 0`). `entering` tells a
/// `Glass` material which side of its interface the ray is crossing: it
/// must come from the *geometric* (un-oriented) normal, since `normal` has
/// already been flipped to face the ray and so can no longer distinguish
/// the two cases on its own.
pub fn sample_bounce(
    material: &Material,
    incoming: Vec3,
    normal: Vec3,
    entering: bool,
    rng: &mut impl Rng,
) -> Bounce {
    match *material {
        Material::Light { .. } => {
            // a light's own bounce is never traced further; the integrator
            // terminates the path as soon as it adds the emission.
            Bounce { direction: normal, attenuation: BLACK, transmitted: false }
        }
        Material::Matte { color } => Bounce {
            direction: cosine_weighted_hemisphere(normal, rng),
            attenuation: color,
            transmitted: false,
        },
        Material::Metal { color, roughness } => Bounce {
            direction: rough_reflect(incoming, normal, roughness, rng),
            attenuation: color,
            transmitted: false,
        },
        Material::Glass { color, ior } => {
            // `normal` is already oriented onto the incoming side for both
            // directions of travel (the integrator flips the geometric
            // normal before calling here), so the refractive-index ratio is
            // the only thing that depends on which way the ray is crossing.
            let n = normal;
            let eta = if entering { 1.0 / ior } else { ior };
            let cos_i = -incoming.dot(n);
            let sin2_t = eta * eta * (1.0 - cos_i * cos_i).max(0.0);
            let reflectance = if sin2_t >= 1.0 {
                1.0 // total internal reflection
            } else {
                let cos_t = (1.0 - sin2_t).sqrt();
                schlick_fresnel(cos_i.min(cos_t), eta)
            };
            if rng.gen::<f64>() < reflectance {
                Bounce {
                    direction: incoming.reflect(n),
                    attenuation: WHITE,
                    transmitted: false,
                }
            } else {
                let cos_t = (1.0 - sin2_t).max(0.0).sqrt();
                let refracted = incoming
                    .scale(eta)
                    .add(n.scale(eta * cos_i - cos_t));
                Bounce { direction: refracted.unit(), attenuation: color, transmitted: true }
            }
        }
    }
}
