use std::{fs, io, path};
use std::collections::HashSet;
use std::io::BufRead;
use flate2::read::GzDecoder;
use crate::sat::formula::Lit;
use crate::sat::{SolveRes, Solver};


/// Parse a DIMACS CNF file, transparently decoding gzipped input, and feed
/// it into a solver built from the header by `init`.
pub fn parse_file<P, S, F>(path: P, validate: bool, init: F) -> io::Result<S>
where
    P: AsRef<path::Path>,
    S: Solver,
    F: FnOnce(usize, usize) -> S,
{
    let mut reader = io::BufReader::new(fs::File::open(path)?);
    let gzipped = reader.fill_buf()?.starts_with(&[0x1f, 0x8b]);
    if gzipped {
        parse(GzDecoder::new(reader), validate, init)
    } else {
        parse(reader, validate, init)
    }
}

/// Parse DIMACS CNF: construct the solver from the `p cnf` header, add every
/// clause as irredundant. Units are installed by the solver as root-level
/// assignments; a contradicting unit or empty clause flips it into the
/// already-unsatisfiable state without solving.
pub fn parse<R, S, F>(reader: R, validate: bool, init: F) -> io::Result<S>
where
    R: io::Read,
    S: Solver,
    F: FnOnce(usize, usize) -> S,
{
    let mut p = DimacsParser::new(reader)?;
    let (vars, clauses) = p.header()?;
    let mut solver = init(vars, clauses);

    let mut raw = Vec::new();
    let mut lits = Vec::new();
    while p.next_clause(&mut raw)? {
        lits.clear();
        for &lit_id in raw.iter() {
            if lit_id.abs() as usize > vars {
                return Err(parse_error(format!(
                    "variable {} out of the declared range 1..{}",
                    lit_id.abs(),
                    vars
                )));
            }
            lits.push(Lit::new(lit_id));
        }
        solver.add_clause(&lits);
    }

    if validate {
        if p.clauses != clauses {
            return Err(parse_error(format!(
                "DIMACS header mismatch: {} clauses declared, {} found",
                clauses, p.clauses
            )));
        }
        if p.max_var as usize > vars {
            return Err(parse_error(format!(
                "DIMACS header mismatch: {} vars declared, {} discovered",
                vars, p.max_var
            )));
        }
    }

    Ok(solver)
}


pub fn write_result<W: io::Write, S>(mut writer: W, result: &SolveRes<S>) -> io::Result<()> {
    match result {
        SolveRes::UnSAT(_) => {
            writeln!(writer, "UNSAT")?;
        }

        SolveRes::Interrupted(_, _) => {
            writeln!(writer, "INDET")?;
        }

        SolveRes::SAT(model, _) => {
            writeln!(writer, "SAT")?;
            for lit in model.iter() {
                write!(writer, "{} ", lit)?;
            }
            writeln!(writer, "0")?;
        }
    }
    Ok(())
}


pub fn validate_model_file<P: AsRef<path::Path>>(path: P, model: &[Lit]) -> io::Result<bool> {
    let mut reader = io::BufReader::new(fs::File::open(path)?);
    let gzipped = reader.fill_buf()?.starts_with(&[0x1f, 0x8b]);
    if gzipped {
        validate_model(GzDecoder::new(reader), model)
    } else {
        validate_model(reader, model)
    }
}

/// Check that the model satisfies every clause of the formula and assigns
/// each variable one polarity only.
pub fn validate_model<R: io::Read>(reader: R, model: &[Lit]) -> io::Result<bool> {
    let mut lits = HashSet::new();
    for lit in model.iter() {
        let lit_id = lit.0;
        lits.insert(lit_id);
        if lits.contains(&(-lit_id)) {
            return Ok(false);
        }
    }

    let mut p = DimacsParser::new(reader)?;
    p.header()?;

    let mut raw = Vec::new();
    while p.next_clause(&mut raw)? {
        if !raw.iter().any(|lit_id| lits.contains(lit_id)) {
            return Ok(false);
        }
    }
    Ok(true)
}


fn parse_error(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("PARSE ERROR! {}", message))
}


/// Cursor over the raw input bytes; DIMACS is ASCII.
struct DimacsParser {
    bytes: Vec<u8>,
    pos: usize,
    max_var: i32,
    clauses: usize,
}

impl DimacsParser {
    fn new<R: io::Read>(mut reader: R) -> io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(DimacsParser { bytes, pos: 0, max_var: 0, clauses: 0 })
    }

    fn header(&mut self) -> io::Result<(usize, usize)> {
        loop {
            self.skip_whitespace();
            match self.current() {
                Some(b'c') => {
                    self.skip_line();
                }
                _ => {
                    self.consume("p")?;
                    self.skip_whitespace();
                    self.consume("cnf")?;
                    let vars = self.next_uint()?;
                    let clauses = self.next_uint()?;
                    return Ok((vars, clauses));
                }
            }
        }
    }

    /// Read the next clause into `lits`. Returns false at end of input.
    fn next_clause(&mut self, lits: &mut Vec<i32>) -> io::Result<bool> {
        loop {
            self.skip_whitespace();
            match self.current() {
                Some(b'c') => {
                    self.skip_line();
                }
                None => {
                    return Ok(false);
                }
                _ => {
                    lits.clear();
                    loop {
                        let lit = self.next_int()?;
                        if lit == 0 {
                            self.clauses += 1;
                            return Ok(true);
                        }
                        self.max_var = self.max_var.max(lit.abs());
                        lits.push(lit);
                    }
                }
            }
        }
    }


    #[inline]
    fn current(&self) -> Option<u8> {
        self.bytes.get(self.pos).cloned()
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            if !c.is_ascii_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.current() {
            self.advance();
            if c == b'\n' {
                break;
            }
        }
    }

    fn consume(&mut self, target: &str) -> io::Result<()> {
        for tc in target.bytes() {
            match self.current() {
                Some(c) if c == tc => self.advance(),
                _ => {
                    return Err(parse_error(format!("expected '{}'", target)));
                }
            }
        }
        Ok(())
    }

    fn read_int_body(&mut self) -> io::Result<usize> {
        let mut len = 0;
        let mut value = 0usize;
        loop {
            match self.current() {
                Some(c) if c.is_ascii_digit() => {
                    value = value * 10 + (c - b'0') as usize;
                    len += 1;
                    self.advance();
                }
                _ if len > 0 => {
                    return Ok(value);
                }
                _ => {
                    return Err(parse_error("int expected".to_string()));
                }
            }
        }
    }

    fn next_int(&mut self) -> io::Result<i32> {
        self.skip_whitespace();
        let sign = match self.current() {
            Some(b'+') => {
                self.advance();
                1
            }
            Some(b'-') => {
                self.advance();
                -1
            }
            _ => 1,
        };
        let val = self.read_int_body()?;
        Ok(sign * (val as i32))
    }

    fn next_uint(&mut self) -> io::Result<usize> {
        self.skip_whitespace();
        if let Some(b'+') = self.current() {
            self.advance();
        }
        self.read_int_body()
    }
}
