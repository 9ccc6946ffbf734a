//! Glob matching with Redis `KEYS` semantics
//!
//! Supported syntax: `*` (any run), `?` (any single char), `[abc]`, `[^abc]`,
//! `[a-z]` and `\` to escape the next character. An unterminated class is
//! closed at the end of the pattern, as Redis does.

/// Whether `name` matches the glob `pattern`
#[must_use]
pub fn matches(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    match_from(&pattern, &name)
}

fn match_from(pattern: &[char], name: &[char]) -> bool {
    let (mut p, mut n) = (0, 0);
    // Pattern index after the last `*` and the name index it is retried from
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        if pattern.get(p) == Some(&'*') {
            p += 1;
            star = Some((p, n));
            continue;
        }
        if let Some(rest) = match_one(&pattern[p..], name[n]) {
            p = pattern.len() - rest.len();
            n += 1;
            continue;
        }
        let Some((after_star, from)) = star else {
            return false;
        };
        p = after_star;
        n = from + 1;
        star = Some((after_star, n));
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Match the leading non-star token of `pattern` against `ch`
///
/// Returns the pattern after the token on a match.
fn match_one(pattern: &[char], ch: char) -> Option<&[char]> {
    match pattern {
        [] | ['*', ..] => None,
        ['?', rest @ ..] => Some(rest),
        ['[', body @ ..] => {
            let (matched, rest) = match_class(body, ch);
            matched.then_some(rest)
        }
        ['\\', escaped, rest @ ..] => (*escaped == ch).then_some(rest),
        [literal, rest @ ..] => (*literal == ch).then_some(rest),
    }
}

/// Match `ch` against a class body; returns the verdict and the pattern after `]`
fn match_class(body: &[char], ch: char) -> (bool, &[char]) {
    let mut rest = body;
    let negate = rest.first() == Some(&'^');
    if negate {
        rest = &rest[1..];
    }

    let mut matched = false;
    loop {
        match rest {
            [] => break,
            [']', tail @ ..] => {
                rest = tail;
                break;
            }
            ['\\', escaped, tail @ ..] => {
                matched |= *escaped == ch;
                rest = tail;
            }
            [lo, '-', hi, tail @ ..] if *hi != ']' => {
                let (lo, hi) = if lo <= hi { (*lo, *hi) } else { (*hi, *lo) };
                matched |= (lo..=hi).contains(&ch);
                rest = tail;
            }
            [single, tail @ ..] => {
                matched |= *single == ch;
                rest = tail;
            }
        }
    }

    (matched != negate, rest)
}
