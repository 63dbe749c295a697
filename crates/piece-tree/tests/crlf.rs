//! Carriage return / line feed handling across piece boundaries.

use piece_tree::{PieceTreeBuffer, PieceTreeOptions};

fn reference_line_count(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut count = 1;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                count += 1;
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => count += 1,
            _ => {}
        }
        i += 1;
    }
    count
}

fn assert_consistent(buffer: &PieceTreeBuffer, expected: &str) {
    assert_eq!(buffer.get_text(), expected);
    assert_eq!(buffer.get_line_count(), reference_line_count(expected), "{expected:?}");
    buffer.model().validate().unwrap();
}

#[test]
fn test_split_inside_pair_and_reassemble() {
    let original = "one\r\ntwo\r\nthree\r\n";
    for offset in 0..=original.len() {
        let mut buffer = PieceTreeBuffer::new(original);
        let before = buffer.model().total_line_feeds();
        buffer.apply_edit(offset, 0, "X");
        buffer.apply_edit(offset, 1, "");
        assert_consistent(&buffer, original);
        assert_eq!(buffer.model().total_line_feeds(), before, "offset {offset}");
    }
}

#[test]
fn test_delete_cr_or_lf_of_pair() {
    let mut buffer = PieceTreeBuffer::new("a\r\nb");
    buffer.apply_edit(2, 1, "");
    assert_consistent(&buffer, "a\rb");
    assert_eq!(buffer.get_line_count(), 2);

    let mut buffer = PieceTreeBuffer::new("a\r\nb");
    buffer.apply_edit(1, 1, "");
    assert_consistent(&buffer, "a\nb");
    assert_eq!(buffer.get_line_count(), 2);
}

#[test]
fn test_delete_joins_two_breaks_into_one() {
    // `\r` + `\r\n`: removing the middle `\r` leaves one pair.
    let mut buffer = PieceTreeBuffer::new("a\r\r\nb");
    assert_eq!(buffer.get_line_count(), 3);
    buffer.apply_edit(2, 1, "");
    assert_consistent(&buffer, "a\r\nb");
    assert_eq!(buffer.get_line_count(), 2);
}

#[test]
fn test_insert_cr_before_lf() {
    let mut buffer = PieceTreeBuffer::new("a\nb");
    buffer.apply_edit(1, 0, "\r");
    assert_consistent(&buffer, "a\r\nb");
    assert_eq!(buffer.get_line_count(), 2);
    assert_eq!(buffer.get_line_content(1), "a");
    assert_eq!(buffer.get_line_raw_content(1), "a\r\n");
}

#[test]
fn test_insert_lf_after_cr_in_middle() {
    let mut buffer = PieceTreeBuffer::new("a\rb");
    buffer.apply_edit(2, 0, "\n");
    assert_consistent(&buffer, "a\r\nb");
    assert_eq!(buffer.get_line_content(2), "b");
}

#[test]
fn test_typed_cr_then_lf() {
    let mut buffer = PieceTreeBuffer::new("");
    let mut expected = String::new();
    for piece in ["x", "\r", "\n", "y", "\r", "\r", "\n", "\n"] {
        buffer.apply_edit(expected.len(), 0, piece);
        expected.push_str(piece);
        assert_consistent(&buffer, &expected);
    }
    assert_eq!(buffer.get_line_count(), 5);
}

#[test]
fn test_delete_across_pairs() {
    let mut buffer = PieceTreeBuffer::new("a\r\nb\r\nc");
    buffer.apply_edit(3, 1, "");
    assert_consistent(&buffer, "a\r\n\r\nc");
    // Removing `\n\r` leaves the first `\r` next to the last `\n`.
    buffer.apply_edit(2, 2, "");
    assert_consistent(&buffer, "a\r\nc");
    assert_eq!(buffer.get_line_count(), 2);
    assert_eq!(buffer.get_line_content(2), "c");
}

#[test]
fn test_position_inside_pair() {
    let buffer = PieceTreeBuffer::new("ab\r\ncd");
    // Offset 3 points at the `\n`: still line 1, one past the content.
    let position = buffer.get_position_at(3);
    assert_eq!(position.line, 1);
    assert_eq!(position.column, 4);
    assert_eq!(buffer.get_offset_at(position.line, position.column), 2);
    assert_eq!(buffer.get_position_at(4).line, 2);
}

#[test]
fn test_lone_cr_lines() {
    let buffer = PieceTreeBuffer::new("a\rb\rc");
    assert_eq!(buffer.get_lines_content(), vec!["a", "b", "c"]);
    assert_eq!(buffer.get_line_raw_content(2), "b\r");
}

#[test]
fn test_pairs_survive_small_chunks() {
    let options = PieceTreeOptions::default().chunk_size(16);
    let text = "0123456789abcd\r\n".repeat(8);
    let mut buffer = PieceTreeBuffer::from_chunks(
        text.as_bytes()
            .chunks(7)
            .map(|chunk| std::str::from_utf8(chunk).unwrap()),
        options,
    );
    assert_consistent(&buffer, &text);

    let insert = "zz\r\n".repeat(10);
    buffer.apply_edit(15, 0, &insert);
    let mut expected = text.clone();
    expected.insert_str(15, &insert);
    assert_consistent(&buffer, &expected);
}
