mod interned;
pub use self::interned::*;

#[derive(Debug, Clone)]
pub struct Located<T> {
    pub t: T,
    pub line: usize,
    pub col: usize,
}
impl<T> Located<T> {
    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Located<U> {
        Located {
            t: f(self.t),
            line: self.line,
            col: self.col,
        }
    }
}
impl<T: core::fmt::Debug> core::fmt::Display for Located<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // lines and columns are stored zero-based
        write!(f, "{}:{}: {:?}", self.line + 1, self.col + 1, self.t)
    }
}

pub trait BoolToErrorHelper {
    fn or_err<E>(self, f: impl FnOnce() -> E) -> Result<(), E>;
}
impl BoolToErrorHelper for bool {
    #[inline(always)]
    fn or_err<E>(self, f: impl FnOnce() -> E) -> Result<(), E> {
        if !self {
            Err(f())
        } else {
            Ok(())
        }
    }
}

#[repr(transparent)]
pub struct CommaSeparated<'s, T: 's>(pub &'s [T]);
impl<'s, T: 's> core::fmt::Display for CommaSeparated<'s, T>
where
    T: core::fmt::Display,
{
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut wrote = false;
        for x in self.0 {
            if wrote {
                f.write_str(", ")?;
            }
            <T as core::fmt::Display>::fmt(x, f)?;
            wrote = true;
        }

        Ok(())
    }
}
