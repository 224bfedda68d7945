//! Exact 1-D total-variation denoising.
//!
//! Solves
//!
//! ```text
//! argmin_z  1/2 ||z - y||_2^2 + lambda * sum_i |z_{i+1} - z_i|
//! ```
//!
//! with the direct taut-string algorithm of Condat (2013), O(n) in practice.

/// Total-variation denoising of `y` with weight `lambda`.
pub fn tv_denoise(y: &[f64], lambda: f64) -> Vec<f64> {
    let n = y.len();
    if n == 0 {
        return Vec::new();
    }
    if lambda <= 0.0 || n == 1 {
        return y.to_vec();
    }

    let mut out = vec![0.0; n];
    let last = n - 1;
    let twolambda = 2.0 * lambda;
    let minlambda = -lambda;

    // k: current sample, k0: start of the current segment
    let mut k = 0usize;
    let mut k0 = 0usize;
    // kplus / kminus: last positions where umax = -lambda / umin = lambda
    let mut kplus = 0usize;
    let mut kminus = 0usize;
    // u: dual variable, [vmin, vmax]: admissible range of the segment value
    let mut umin = lambda;
    let mut umax = minlambda;
    let mut vmin = y[0] - lambda;
    let mut vmax = y[0] + lambda;

    loop {
        while k == last {
            if umin < 0.0 {
                // vmin too high: negative jump
                loop {
                    out[k0] = vmin;
                    k0 += 1;
                    if k0 > kminus {
                        break;
                    }
                }
                k = k0;
                kminus = k;
                vmin = y[k];
                umin = lambda;
                umax = vmin + umin - vmax;
            } else if umax > 0.0 {
                // vmax too low: positive jump
                loop {
                    out[k0] = vmax;
                    k0 += 1;
                    if k0 > kplus {
                        break;
                    }
                }
                k = k0;
                kplus = k;
                vmax = y[k];
                umax = minlambda;
                umin = vmax + umax - vmin;
            } else {
                vmin += umin / (k - k0 + 1) as f64;
                loop {
                    out[k0] = vmin;
                    k0 += 1;
                    if k0 > k {
                        break;
                    }
                }
                return out;
            }
        }

        umin += y[k + 1] - vmin;
        if umin < minlambda {
            loop {
                out[k0] = vmin;
                k0 += 1;
                if k0 > kminus {
                    break;
                }
            }
            k = k0;
            kplus = k;
            kminus = k;
            vmin = y[k];
            vmax = vmin + twolambda;
            umin = lambda;
            umax = minlambda;
            continue;
        }

        umax += y[k + 1] - vmax;
        if umax > lambda {
            loop {
                out[k0] = vmax;
                k0 += 1;
                if k0 > kplus {
                    break;
                }
            }
            k = k0;
            kplus = k;
            kminus = k;
            vmax = y[k];
            vmin = vmax - twolambda;
            umin = lambda;
            umax = minlambda;
        } else {
            k += 1;
            if umin >= lambda {
                kminus = k;
                vmin += (umin - lambda) / (kminus - k0 + 1) as f64;
                umin = lambda;
            }
            if umax <= minlambda {
                kplus = k;
                vmax += (umax + lambda) / (kplus - k0 + 1) as f64;
                umax = minlambda;
            }
        }
    }
}
