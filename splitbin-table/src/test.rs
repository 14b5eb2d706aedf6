mod split2;

pub(crate) fn lcg_rand_step(state: &mut u32) {
    *state = (*state as u64 * 279470273u64 % 0xfffffffb) as u32;
}

// Something shaped like a per-codepoint attribute table: long runs of a
// handful of ids, a scattering of one-off values, and a length that is not a
// power of two.
pub(crate) fn runs_table(len: usize, seed: u32) -> Vec<u32> {
    let mut state = seed;
    let mut t = Vec::with_capacity(len);
    while t.len() < len {
        lcg_rand_step(&mut state);
        let val = state % 8;
        lcg_rand_step(&mut state);
        let run = 1 + (state % 300) as usize;
        for _ in 0..run.min(len - t.len()) {
            t.push(val);
        }
    }
    for _ in 0..len / 64 {
        lcg_rand_step(&mut state);
        let i = state as usize % len;
        lcg_rand_step(&mut state);
        t[i] = 8 + state % 600;
    }
    t
}
