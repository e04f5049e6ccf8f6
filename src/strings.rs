// String literals understand the usual backslash escapes; an escaped
// character with no special meaning stands for itself. Regexp literals only
// unescape the delimiter and leave everything else to the regex engine.

use bimap::BiMap;
use std::str::Chars;

lazy_static! {
    static ref ESCAPES: BiMap<char, char> = {
        let mut m = BiMap::new();
        m.insert('\\', '\\');
        m.insert('"', '"');
        m.insert('n', '\n');
        m.insert('t', '\t');
        m.insert('r', '\r');
        m.insert('0', '\0');
        m.insert('e', '\x1b');
        m
    };
}

struct StringBuilder<'a> {
    chars: Chars<'a>,
}

impl<'a> StringBuilder<'a> {
    fn new(src: &'a str) -> Self {
        Self { chars: src.chars() }
    }
}

impl Iterator for StringBuilder<'_> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self.chars.next()? {
            '\\' => match self.chars.next() {
                // The tokenizer never hands over a lone trailing backslash.
                None => '\\',
                Some('s') => ' ',
                Some(c) => ESCAPES.get_by_left(&c).copied().unwrap_or(c),
            },
            c => c,
        };
        Some(result)
    }
}

pub(crate) fn build_string(src: &str) -> String {
    StringBuilder::new(src).collect()
}

pub(crate) fn build_regexp(src: &str) -> String {
    src.replace("\\/", "/")
}

struct StringPrinter<'a> {
    chars: Chars<'a>,
}

impl<'a> StringPrinter<'a> {
    fn new(src: &'a str) -> Self {
        Self { chars: src.chars() }
    }
}

impl Iterator for StringPrinter<'_> {
    type Item = (char, Option<char>);

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.chars.next()?;
        let charseq = match ESCAPES.get_by_right(&next) {
            Some(&l) => ('\\', Some(l)),
            None => (next, None),
        };
        Some(charseq)
    }
}

pub(crate) fn string_repr(src: &str) -> String {
    let mut output = String::new();
    output.push('"');
    for (char1, char2) in StringPrinter::new(src) {
        output.push(char1);
        if let Some(char2) = char2 {
            output.push(char2)
        };
    }
    output.push('"');
    output
}

pub(crate) fn regexp_repr(src: &str) -> String {
    format!("/{}/", src.replace('/', "\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_escapes() {
        assert_eq!(build_string(r#"a\nb\t\"c\"\\"#), "a\nb\t\"c\"\\");
        assert_eq!(build_string(r"\s\e"), " \x1b");
    }

    #[test]
    fn unknown_escapes_stand_for_themselves() {
        assert_eq!(build_string(r"\q\/"), "q/");
    }

    #[test]
    fn repr_reads_back() {
        let original = "tab\there \"quoted\" back\\slash\nnewline";
        let printed = string_repr(original);
        assert_eq!(build_string(&printed[1..printed.len() - 1]), original);
    }

    #[test]
    fn regexp_unescapes_only_the_delimiter() {
        assert_eq!(build_regexp(r"a\/b\d+"), r"a/b\d+");
        assert_eq!(regexp_repr(r"a/b\d+"), r"/a\/b\d+/");
    }
}
