//! Choosing which slides to extract.

use std::io::{self, BufRead, Write};

/// Slide numbers to process, 1-based, in the requested order.
///
/// Out-of-range and repeated numbers are dropped. With no request, or when
/// nothing valid remains, every slide is selected.
pub fn resolve_selection(requested: Option<&[usize]>, total: usize) -> Vec<usize> {
    let all = || (1..=total).collect::<Vec<usize>>();

    let Some(requested) = requested else {
        return all();
    };

    let mut selected: Vec<usize> = Vec::with_capacity(requested.len());
    for &n in requested {
        if (1..=total).contains(&n) && !selected.contains(&n) {
            selected.push(n);
        }
    }

    if selected.is_empty() {
        log::warn!("No valid slide numbers provided. Processing all slides.");
        return all();
    }
    selected
}

/// Parse a comma-separated list such as `1, 3,5`.
pub fn parse_slide_list(input: &str) -> Result<Vec<usize>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| format!("'{}' is not a slide number", s))
        })
        .collect()
}

/// Ask which slides to extract.
///
/// Returns `None` for all slides. End of input also selects all slides.
pub fn prompt_slide_selection<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    total: usize,
) -> io::Result<Option<Vec<usize>>> {
    writeln!(output, "\nPresentation has {} slides.", total)?;
    writeln!(output, "Options:")?;
    writeln!(output, "  1. Extract all slides")?;
    writeln!(output, "  2. Extract specific slides")?;

    loop {
        write!(output, "\nEnter your choice (1 or 2): ")?;
        output.flush()?;
        let Some(choice) = read_line(input)? else {
            return Ok(None);
        };

        match choice.as_str() {
            "1" => return Ok(None),
            "2" => {
                writeln!(output, "\nEnter slide numbers (separated by commas, e.g., 1,3,5):")?;
                write!(output, "Slide numbers: ")?;
                output.flush()?;
                let Some(line) = read_line(input)? else {
                    return Ok(None);
                };

                match parse_slide_list(&line) {
                    Ok(numbers) => {
                        let valid: Vec<usize> = numbers
                            .into_iter()
                            .filter(|n| (1..=total).contains(n))
                            .collect();
                        if valid.is_empty() {
                            writeln!(
                                output,
                                "Invalid slide numbers. Please enter numbers between 1 and {}.",
                                total
                            )?;
                            continue;
                        }
                        return Ok(Some(valid));
                    }
                    Err(_) => {
                        writeln!(output, "Invalid input. Please enter numbers separated by commas.")?;
                    }
                }
            }
            _ => writeln!(output, "Invalid choice. Please enter 1 or 2.")?,
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
