//! Discrete Fourier transforms.
//!
//! Power-of-two lengths use an iterative radix-2 Cooley–Tukey transform;
//! other lengths go through Bluestein's chirp-z reformulation on top of it.
//! The 2-D transform is separable: rows first, then columns.

use std::f64::consts::PI;

pub(crate) type C64 = nalgebra::Complex<f64>;

/// Forward DFT of `buf` in place (unnormalized, `e^{-2πi kn/N}` kernel).
pub(crate) fn fft_in_place(buf: &mut [C64]) {
    let n = buf.len();
    if n <= 1 {
        return;
    }
    if n.is_power_of_two() {
        radix2(buf);
    } else {
        bluestein(buf);
    }
}

/// Inverse DFT of `buf` in place, normalized by `1/N`.
pub(crate) fn ifft_in_place(buf: &mut [C64]) {
    let n = buf.len();
    if n == 0 {
        return;
    }
    buf.iter_mut().for_each(|v| *v = v.conj());
    fft_in_place(buf);
    let inv = 1.0 / n as f64;
    buf.iter_mut().for_each(|v| *v = v.conj() * inv);
}

/// Row-major 2-D DFT of a real `w × h` grid.
pub(crate) fn fft2d(data: &[f64], w: usize, h: usize) -> Vec<C64> {
    debug_assert_eq!(data.len(), w * h);
    let mut grid: Vec<C64> = data.iter().map(|&v| C64::new(v, 0.0)).collect();
    if w == 0 || h == 0 {
        return grid;
    }

    for row in grid.chunks_exact_mut(w) {
        fft_in_place(row);
    }

    let mut col = vec![C64::new(0.0, 0.0); h];
    for x in 0..w {
        for y in 0..h {
            col[y] = grid[y * w + x];
        }
        fft_in_place(&mut col);
        for y in 0..h {
            grid[y * w + x] = col[y];
        }
    }
    grid
}

/// Move the zero-frequency bin to `(w/2, h/2)`.
pub(crate) fn fftshift<T: Copy>(data: &[T], w: usize, h: usize) -> Vec<T> {
    let mut out = data.to_vec();
    for y in 0..h {
        let sy = (y + h / 2) % h;
        for x in 0..w {
            let sx = (x + w / 2) % w;
            out[sy * w + sx] = data[y * w + x];
        }
    }
    out
}

fn radix2(buf: &mut [C64]) {
    let n = buf.len();
    let bits = n.trailing_zeros();

    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            buf.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let ang = -2.0 * PI / len as f64;
        let w_len = C64::new(ang.cos(), ang.sin());
        for start in (0..n).step_by(len) {
            let mut w = C64::new(1.0, 0.0);
            for k in 0..len / 2 {
                let u = buf[start + k];
                let v = buf[start + k + len / 2] * w;
                buf[start + k] = u + v;
                buf[start + k + len / 2] = u - v;
                w *= w_len;
            }
        }
        len <<= 1;
    }
}

fn bluestein(buf: &mut [C64]) {
    let n = buf.len();
    let m = (2 * n - 1).next_power_of_two();

    // chirp[k] = e^{-iπ k²/n}; k² is reduced mod 2n to keep the angle small.
    let chirp: Vec<C64> = (0..n)
        .map(|k| {
            let k2 = (k as u128 * k as u128 % (2 * n as u128)) as f64;
            let ang = -PI * k2 / n as f64;
            C64::new(ang.cos(), ang.sin())
        })
        .collect();

    let mut a = vec![C64::new(0.0, 0.0); m];
    for k in 0..n {
        a[k] = buf[k] * chirp[k];
    }
    let mut b = vec![C64::new(0.0, 0.0); m];
    b[0] = chirp[0].conj();
    for k in 1..n {
        let c = chirp[k].conj();
        b[k] = c;
        b[m - k] = c;
    }

    radix2(&mut a);
    radix2(&mut b);
    for (x, y) in a.iter_mut().zip(b.iter()) {
        *x *= *y;
    }
    ifft_in_place(&mut a);

    for k in 0..n {
        buf[k] = a[k] * chirp[k];
    }
}
