/// RFC3961 n-fold. Stretches or shrinks `input` to `out_len` bytes by concatenating
/// copies rotated right by 13 bits each, up to the lcm of both lengths, then summing
/// the `out_len` sized chunks with ones' complement addition.
///
/// An empty input folds to all zeros.
pub fn nfold(input: &[u8], out_len: usize) -> Vec<u8> {
    let mut out = vec![0u8; out_len];
    if input.is_empty() || out_len == 0 {
        return out;
    }

    let in_len = input.len();
    let lcm = lcm(in_len, out_len);

    let mut expanded = Vec::with_capacity(lcm);
    for i in 0..(lcm / in_len) {
        expanded.extend(rotate_right(input, 13 * i));
    }

    for chunk in expanded.chunks_exact(out_len) {
        ones_complement_add(&mut out, chunk);
    }

    out
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}

// Rotate the whole buffer right as one big-endian bit string.
fn rotate_right(input: &[u8], nbits: usize) -> impl Iterator<Item = u8> + '_ {
    let len = input.len();
    let byte_shift = (nbits / 8) % len;
    let bit_shift = (nbits % 8) as u32;

    (0..len).map(move |i| {
        let hi = u16::from(input[(i + len - byte_shift) % len]);
        let lo = u16::from(input[(i + 2 * len - byte_shift - 1) % len]);
        ((hi >> bit_shift) | (lo << (8 - bit_shift))) as u8
    })
}

// Big-endian add with the carry out of the top byte wrapped around to the bottom.
fn ones_complement_add(acc: &mut [u8], chunk: &[u8]) {
    let mut carry = 0u16;
    for (a, b) in acc.iter_mut().zip(chunk).rev() {
        let sum = u16::from(*a) + u16::from(*b) + carry;
        *a = sum as u8;
        carry = sum >> 8;
    }

    while carry != 0 {
        for a in acc.iter_mut().rev() {
            let sum = u16::from(*a) + carry;
            *a = sum as u8;
            carry = sum >> 8;
            if carry == 0 {
                break;
            }
        }
    }
}
