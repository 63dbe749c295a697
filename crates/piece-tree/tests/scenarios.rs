//! End-to-end scenarios on the public buffer API.

use piece_tree::{
    AppliedEdit, EndOfLinePreference, LineEnding, PieceTreeBuffer, PieceTreeOptions, Position,
    TextRange,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_insert_into_middle() {
    let mut buffer = PieceTreeBuffer::new("ac");
    buffer.apply_edit(1, 0, "b");
    assert_eq!(buffer.get_text(), "abc");
    assert_eq!(buffer.get_position_at(1), Position::new(1, 2));
}

#[test]
fn test_lf_after_cr_counts_one_break() {
    let mut buffer = PieceTreeBuffer::new("a\r");
    buffer.apply_edit(2, 0, "\n");
    assert_eq!(buffer.get_text(), "a\r\n");
    assert_eq!(buffer.model().total_line_feeds(), 1);
    assert_eq!(buffer.get_line_count(), 2);
    buffer.model().validate().unwrap();
}

#[test]
fn test_delete_cr_of_pair_keeps_line_count() {
    let mut buffer = PieceTreeBuffer::new("a\r\nb");
    buffer.apply_edit(1, 1, "");
    assert_eq!(buffer.get_text(), "a\nb");
    assert_eq!(buffer.model().total_line_feeds(), 1);
    assert_eq!(buffer.get_line_count(), 2);
    buffer.model().validate().unwrap();
}

#[test]
fn test_chunk_layout_does_not_affect_equality() {
    let a = PieceTreeBuffer::from_chunks(["abc"], PieceTreeOptions::default());
    let b = PieceTreeBuffer::from_chunks(["ab", "c"], PieceTreeOptions::default());
    assert!(a.equal(&b));
    assert!(b.equal(&a));
}

#[test]
fn test_thousand_random_edits_from_empty() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut buffer = PieceTreeBuffer::default();
    let mut mirror = String::new();

    for _ in 0..1000 {
        let len = mirror.len();
        if len == 0 || rng.gen_bool(0.6) {
            let offset = rng.gen_range(0..=len);
            let text: String = (0..rng.gen_range(1..8))
                .map(|_| rng.gen_range(b'a'..=b'z') as char)
                .collect();
            buffer.apply_edit(offset, 0, &text);
            mirror.insert_str(offset, &text);
        } else {
            let offset = rng.gen_range(0..len);
            let length = rng.gen_range(1..=(len - offset).min(12));
            buffer.apply_edit(offset, length, "");
            mirror.replace_range(offset..offset + length, "");
        }
    }

    assert_eq!(buffer.get_text(), mirror);
    buffer.model().validate().unwrap();
}

#[test]
fn test_replace_reports_applied_edit() {
    let mut buffer = PieceTreeBuffer::new("let x = 1;\nlet y = 2;\n");
    let edit = buffer.apply_edit(4, 1, "value");
    assert_eq!(
        edit,
        AppliedEdit {
            offset: 4,
            deleted_length: 1,
            inserted_length: 5,
        }
    );
    assert_eq!(buffer.get_line_content(1), "let value = 1;");
    // A decoration sitting on `y` moves with the edit.
    let y = 15;
    assert_eq!(edit.map_offset(y), 19);
    assert_eq!(buffer.get_char_code(19), u32::from(b'y'));
}

#[test]
fn test_lines_after_edits() {
    let mut buffer = PieceTreeBuffer::new("one\ntwo\nthree");
    buffer.apply_edit(4, 3, "2\n2.5");
    assert_eq!(
        buffer.get_lines_content(),
        vec!["one", "2", "2.5", "three"]
    );
    assert_eq!(buffer.get_line_raw_content(2), "2\n");
    assert_eq!(buffer.get_line_length(3), 3);
    assert_eq!(buffer.get_offset_at(4, 1), 10);
    assert_eq!(buffer.get_position_at(10), Position::new(4, 1));
}

#[test]
fn test_positions_clamp() {
    let buffer = PieceTreeBuffer::new("ab\ncd");
    assert_eq!(buffer.get_offset_at(0, 5), 0);
    assert_eq!(buffer.get_offset_at(1, 0), 0);
    assert_eq!(buffer.get_offset_at(1, 99), 2);
    assert_eq!(buffer.get_offset_at(9, 1), 5);
    assert_eq!(buffer.get_position_at(99), Position::new(2, 3));
    assert_eq!(buffer.get_line_content(0), "");
    assert_eq!(buffer.get_line_content(3), "");
}

#[test]
fn test_empty_buffer() {
    let buffer = PieceTreeBuffer::default();
    assert_eq!(buffer.get_line_count(), 1);
    assert_eq!(buffer.get_line_content(1), "");
    assert_eq!(buffer.get_position_at(0), Position::new(1, 1));
    assert_eq!(buffer.get_offset_at(1, 1), 0);
    assert_eq!(buffer.get_char_code(0), 0);
    assert_eq!(buffer.get_nearest_chunk(0), "");
    buffer.model().validate().unwrap();
}

#[test]
fn test_delete_everything_then_type() {
    let mut buffer = PieceTreeBuffer::new("abc\ndef");
    buffer.apply_edit(0, 7, "");
    assert!(buffer.is_empty());
    assert_eq!(buffer.model().piece_count(), 0);
    buffer.apply_edit(0, 0, "x");
    buffer.apply_edit(1, 0, "y");
    assert_eq!(buffer.get_text(), "xy");
    buffer.model().validate().unwrap();
}

#[test]
fn test_value_in_range_across_edits() {
    let mut buffer = PieceTreeBuffer::new("0123456789");
    buffer.apply_edit(5, 0, "abc");
    assert_eq!(buffer.get_value_in_range(3, 10), "34abc56");
    let range = TextRange::from_coords(1, 4, 1, 11);
    assert_eq!(
        buffer.get_value_in_range_with_eol(range, EndOfLinePreference::TextDefined),
        "34abc56"
    );
}

#[test]
fn test_unicode_columns_are_bytes() {
    let buffer = PieceTreeBuffer::new("héllo\nwörld");
    assert_eq!(buffer.get_line_length(1), 6);
    assert_eq!(buffer.get_position_at(3), Position::new(1, 4));
    assert_eq!(buffer.char_at(1), Some('é'));
    assert_eq!(buffer.get_offset_at(2, 2), 8);
    assert_eq!(buffer.char_at(8), Some('ö'));
    assert_eq!(buffer.char_at(9), None);
}

#[test]
fn test_set_eol_then_edit() {
    let mut buffer = PieceTreeBuffer::new("a\nb\nc");
    assert_eq!(buffer.get_eol(), LineEnding::Lf);
    buffer.set_eol(LineEnding::Crlf);
    assert_eq!(buffer.get_text(), "a\r\nb\r\nc");
    buffer.apply_edit(2, 0, "X");
    assert_eq!(buffer.get_text(), "a\rX\nb\r\nc");
    assert_eq!(buffer.get_line_count(), 4);
    buffer.model().validate().unwrap();
}
