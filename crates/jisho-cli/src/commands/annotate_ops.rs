use jisho_core::annotation::{parse_annotation, plain_text, render_html};

/// Print the segments of an annotated breakdown and their ruby markup.
pub fn annotate(text: &str) {
    let segments = parse_annotation(text);
    if segments.is_empty() {
        println!("(no segments)");
        return;
    }
    for (i, seg) in segments.iter().enumerate() {
        match &seg.rt {
            Some(rt) => println!("{i:>3}  {}\t{rt}", seg.ruby),
            None => println!("{i:>3}  {}", seg.ruby),
        }
    }
    println!("text: {}", plain_text(&segments));
    println!("html: {}", render_html(&segments));
}
