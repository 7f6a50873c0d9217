use super::op::Transfer;

/// Line size assumed when the memory service reports none.
pub const DEFAULT_LINE_SIZE: u64 = 64;

/// Length of the next chunk of `t`.
///
/// The first chunk stops at the next line boundary of the base address,
/// later chunks are whole lines clipped to what remains.
pub fn chunk_len(t: &Transfer, line_size: u64) -> u64 {
  let remaining = t.remaining();
  if t.offset == 0 {
    let align = t.base % line_size;
    (line_size - align).min(remaining)
  } else {
    line_size.min(remaining)
  }
}

/// Address and length of the next chunk, or `None` once the transfer is done.
pub fn next_chunk(t: &Transfer, line_size: u64) -> Option<(u64, u64)> {
  if t.is_done() {
    None
  } else {
    Some((t.base + t.offset, chunk_len(t, line_size)))
  }
}

/// Full chunk sequence of a transfer that always gets what it asks for.
pub fn plan_chunks(base: u64, total: u64, line_size: u64) -> Vec<(u64, u64)> {
  let mut t = Transfer::new(base, total);
  let mut plan = Vec::new();
  while let Some((addr, len)) = next_chunk(&t, line_size) {
    plan.push((addr, len));
    t.advance(len);
  }
  plan
}

/// Split one read response into whole operands.
///
/// `offset_before` is the transfer offset before this chunk. Operands are
/// emitted as `(element_index, bytes)`; a trailing partial operand is parked
/// in `carry` and completed by the following chunk.
pub fn assemble_elements(
  carry: &mut Vec<u8>,
  chunk: &[u8],
  offset_before: u64,
  operand_size: usize,
  mut emit: impl FnMut(usize, &[u8]),
) {
  let start = (offset_before - carry.len() as u64) as usize;
  let mut merged = std::mem::take(carry);
  merged.extend_from_slice(chunk);

  let whole = merged.len() / operand_size * operand_size;
  for (n, elem) in merged[..whole].chunks_exact(operand_size).enumerate() {
    emit(start / operand_size + n, elem);
  }
  carry.extend_from_slice(&merged[whole..]);
}
