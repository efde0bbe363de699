use std::io::{self, BufRead, Write};

/// Reads one line without its trailing newline. `None` means the input
/// ended.
pub fn read_line(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }

    Ok(Some(line.trim_end().to_string()))
}

/// Asks for a field until `parse` accepts it, printing the rejection message
/// after every invalid answer. `None` means the input ended before a valid
/// answer arrived.
pub fn prompt<R, W, T, F>(
    reader: &mut R,
    writer: &mut W,
    label: &str,
    parse: F,
) -> io::Result<Option<T>>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> Result<T, &'static str>,
{
    loop {
        write!(writer, "{}: ", label)?;
        writer.flush()?;

        let line = match read_line(reader)? {
            Some(line) => line,
            None => return Ok(None),
        };

        match parse(line.trim()) {
            Ok(value) => return Ok(Some(value)),
            Err(message) => writeln!(writer, "{}", message)?,
        }
    }
}
