//! Seeded random edits checked against a `String` and a `ropey::Rope`.

use piece_tree::{PieceTreeBuffer, PieceTreeOptions};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use ropey::Rope;

const ALPHABET: &[&str] = &[
    "a", "b", "\r", "\n", "\r\n", "é", "中", "xyz", "\n\r", "  ", "\r\r", "🦀",
];

fn boundaries(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}

fn random_text(rng: &mut StdRng) -> String {
    (0..rng.gen_range(1..6))
        .map(|_| *ALPHABET.choose(rng).unwrap_or(&"a"))
        .collect()
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .or_else(|| line.strip_suffix('\r'))
        .unwrap_or(line)
}

fn compare_lines(buffer: &PieceTreeBuffer, rope: &Rope) {
    assert_eq!(buffer.get_line_count(), rope.len_lines());
    for i in 0..rope.len_lines() {
        let line = i + 1;
        let expected = rope.line(i).to_string();
        assert_eq!(buffer.get_line_content(line), strip_terminator(&expected), "line {line}");
        assert_eq!(buffer.get_line_raw_content(line), expected, "raw line {line}");
        assert_eq!(buffer.get_offset_at(line, 1), rope.line_to_byte(i), "start of line {line}");
    }
}

fn compare_positions(buffer: &PieceTreeBuffer, rope: &Rope, mirror: &str) {
    for offset in boundaries(mirror) {
        let position = buffer.get_position_at(offset);
        assert_eq!(position.line - 1, rope.byte_to_line(offset), "offset {offset}");
        assert_eq!(
            offset - rope.line_to_byte(position.line - 1),
            position.column - 1,
            "column of offset {offset}"
        );
    }
}

fn run(seed: u64, options: PieceTreeOptions, ops: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut buffer = PieceTreeBuffer::with_options("", options);
    let mut mirror = String::new();
    let mut rope = Rope::new();

    for step in 0..ops {
        let candidates = boundaries(&mirror);
        let start = *candidates.choose(&mut rng).unwrap_or(&0);

        if mirror.is_empty() || rng.gen_bool(0.55) {
            let text = if rng.gen_ratio(1, 50) {
                random_text(&mut rng).repeat(12)
            } else {
                random_text(&mut rng)
            };
            buffer.apply_edit(start, 0, &text);
            rope.insert(rope.byte_to_char(start), &text);
            mirror.insert_str(start, &text);
        } else {
            let ends: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&end| end > start && end - start <= 24)
                .collect();
            let Some(&end) = ends.choose(&mut rng) else {
                continue;
            };
            let replacement = if rng.gen_bool(0.3) {
                random_text(&mut rng)
            } else {
                String::new()
            };
            buffer.apply_edit(start, end - start, &replacement);
            rope.remove(rope.byte_to_char(start)..rope.byte_to_char(end));
            rope.insert(rope.byte_to_char(start), &replacement);
            mirror.replace_range(start..end, &replacement);
        }

        if let Err(violation) = buffer.model().validate() {
            panic!("step {step}: {violation}");
        }
        assert_eq!(buffer.len(), mirror.len(), "step {step}");

        if step % 25 == 0 {
            assert_eq!(buffer.get_text(), mirror, "step {step}");
            compare_lines(&buffer, &rope);
            compare_positions(&buffer, &rope, &mirror);
        }
    }

    assert_eq!(buffer.get_text(), mirror);
    assert_eq!(rope.to_string(), mirror);
    compare_lines(&buffer, &rope);
    compare_positions(&buffer, &rope, &mirror);
}

#[test]
fn test_random_edits_default_options() {
    for seed in [1, 7, 42] {
        run(seed, PieceTreeOptions::default(), 1500);
    }
}

#[test]
fn test_random_edits_tiny_chunks() {
    let options = PieceTreeOptions::default()
        .chunk_size(16)
        .cache_clear_threshold(20);
    for seed in [3, 11] {
        run(seed, options.clone(), 1500);
    }
}

#[test]
fn test_random_edits_from_chunked_document() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut mirror = String::new();
    for _ in 0..400 {
        mirror.push_str(&random_text(&mut rng));
    }
    let cuts = boundaries(&mirror);
    let mut chunks = Vec::new();
    let mut last = 0;
    for &cut in cuts.iter().step_by(13).skip(1) {
        chunks.push(&mirror[last..cut]);
        last = cut;
    }
    chunks.push(&mirror[last..]);

    let options = PieceTreeOptions::default().chunk_size(32);
    let mut buffer = PieceTreeBuffer::from_chunks(chunks.iter().copied(), options);
    let mut rope = Rope::from_str(&mirror);
    buffer.model().validate().unwrap();
    assert_eq!(buffer.get_text(), mirror);
    compare_lines(&buffer, &rope);

    for _ in 0..500 {
        let candidates = boundaries(&mirror);
        let start = *candidates.choose(&mut rng).unwrap_or(&0);
        let end = candidates
            .iter()
            .copied()
            .find(|&end| end >= start + rng.gen_range(0..8))
            .unwrap_or(mirror.len());
        let text = random_text(&mut rng);
        buffer.apply_edit(start, end - start, &text);
        rope.remove(rope.byte_to_char(start)..rope.byte_to_char(end));
        rope.insert(rope.byte_to_char(start), &text);
        mirror.replace_range(start..end, &text);
        buffer.model().validate().unwrap();
    }

    assert_eq!(buffer.get_text(), mirror);
    compare_lines(&buffer, &rope);
    compare_positions(&buffer, &rope, &mirror);
}
