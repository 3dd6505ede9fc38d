use std::cell::RefCell;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::rc::Rc;
use std::str::FromStr;

use crate::api::capture::*;
use crate::prelude::Collectable;

fn convert<T: FromStr>(token: &str) -> Result<T, InvalidCapture> {
    T::from_str(token).map_err(|_| InvalidCapture::InvalidConversion {
        token: token.to_string(),
        type_name: std::any::type_name::<T>(),
    })
}

/// A parameter that takes a single value, overwriting on each capture.
pub struct Scalar<'a, T> {
    variable: Rc<RefCell<&'a mut T>>,
}

impl<'a, T> CliFlag for Scalar<'a, T> {}
impl<'a, T> CliArgument for Scalar<'a, T> {}

impl<'a, T> Scalar<'a, T> {
    /// Create a scalar parameter.
    pub fn new(variable: &'a mut T) -> Self {
        Self {
            variable: Rc::new(RefCell::new(variable)),
        }
    }
}

impl<'a, T> GenericCapturable<'a, T> for Scalar<'a, T>
where
    T: FromStr,
{
    fn capture(&mut self, token: &str) -> Result<(), InvalidCapture> {
        let value = convert::<T>(token)?;
        **self.variable.borrow_mut() = value;
        Ok(())
    }
}

/// A boolean flag parameter.
///
/// Matches `--name` (true) and `--no-name` (false) without consuming a value.
pub struct Switch<'a> {
    variable: Rc<RefCell<&'a mut bool>>,
}

impl<'a> CliFlag for Switch<'a> {}

impl<'a> Switch<'a> {
    /// Create a switch parameter.
    pub fn new(variable: &'a mut bool) -> Self {
        Self {
            variable: Rc::new(RefCell::new(variable)),
        }
    }
}

impl<'a> GenericCapturable<'a, bool> for Switch<'a> {
    fn capture(&mut self, token: &str) -> Result<(), InvalidCapture> {
        let value = convert::<bool>(token)?;
        **self.variable.borrow_mut() = value;
        Ok(())
    }

    fn is_boolean(&self) -> bool {
        true
    }
}

/// A repeatable boolean flag parameter which counts its occurrences (ex: `-vvv`).
///
/// `--no-name` resets the count to zero.
pub struct Counter<'a> {
    variable: Rc<RefCell<&'a mut usize>>,
}

impl<'a> CliFlag for Counter<'a> {}

impl<'a> Counter<'a> {
    /// Create a counter parameter.
    pub fn new(variable: &'a mut usize) -> Self {
        Self {
            variable: Rc::new(RefCell::new(variable)),
        }
    }
}

impl<'a> GenericCapturable<'a, usize> for Counter<'a> {
    fn capture(&mut self, token: &str) -> Result<(), InvalidCapture> {
        let mut variable = self.variable.borrow_mut();

        if convert::<bool>(token)? {
            **variable += 1;
        } else {
            **variable = 0;
        }

        Ok(())
    }

    fn is_boolean(&self) -> bool {
        true
    }

    fn is_cumulative(&self) -> bool {
        true
    }
}

/// A parameter that maps down to [`Option`], taking a single value.
pub struct Optional<'a, T> {
    variable: Rc<RefCell<&'a mut Option<T>>>,
}

impl<'a, T> CliFlag for Optional<'a, T> {}
impl<'a, T> CliArgument for Optional<'a, T> {}

impl<'a, T> Optional<'a, T> {
    /// Create an optional parameter.
    pub fn new(variable: &'a mut Option<T>) -> Self {
        Self {
            variable: Rc::new(RefCell::new(variable)),
        }
    }
}

impl<'a, T> GenericCapturable<'a, T> for Optional<'a, T>
where
    T: FromStr,
{
    fn capture(&mut self, token: &str) -> Result<(), InvalidCapture> {
        let value = convert::<T>(token)?;
        self.variable.borrow_mut().replace(value);
        Ok(())
    }
}

/// A parameter that takes one value out of an enumerated set.
///
/// The allowed values double as completion candidates.
pub struct Choice<'a, T> {
    variable: Rc<RefCell<&'a mut T>>,
    choices: Vec<String>,
}

impl<'a, T> CliFlag for Choice<'a, T> {}
impl<'a, T> CliArgument for Choice<'a, T> {}

impl<'a, T> Choice<'a, T> {
    /// Create a choice parameter.
    pub fn new(
        variable: &'a mut T,
        choices: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            variable: Rc::new(RefCell::new(variable)),
            choices: choices.into_iter().map(|c| c.into()).collect(),
        }
    }
}

impl<'a, T> GenericCapturable<'a, T> for Choice<'a, T>
where
    T: FromStr,
{
    fn capture(&mut self, token: &str) -> Result<(), InvalidCapture> {
        if !self.choices.iter().any(|choice| choice == token) {
            return Err(InvalidCapture::InvalidChoice {
                token: token.to_string(),
                choices: self.choices.clone(),
            });
        }

        let value = convert::<T>(token)?;
        **self.variable.borrow_mut() = value;
        Ok(())
    }

    fn hints(&self) -> Vec<String> {
        self.choices.clone()
    }
}

/// A parameter that accumulates every value it is given.
///
/// As an argument, it consumes all remaining positional tokens, so it must be the last argument of its command.
/// As a flag, it may be repeated.
pub struct Collection<'a, C, T>
where
    C: 'a + Collectable<T>,
{
    variable: Rc<RefCell<&'a mut C>>,
    _phantom: PhantomData<T>,
}

impl<'a, C, T> CliFlag for Collection<'a, C, T> where C: 'a + Collectable<T> {}

impl<'a, C, T> CliArgument for Collection<'a, C, T> where C: 'a + Collectable<T> {}

impl<'a, C, T> Collection<'a, C, T>
where
    C: 'a + Collectable<T>,
{
    /// Create a collection parameter.
    pub fn new(variable: &'a mut C) -> Self {
        Self {
            variable: Rc::new(RefCell::new(variable)),
            _phantom: PhantomData,
        }
    }
}

impl<'a, C, T> GenericCapturable<'a, T> for Collection<'a, C, T>
where
    T: FromStr,
    C: 'a + Collectable<T>,
{
    fn capture(&mut self, token: &str) -> Result<(), InvalidCapture> {
        let value = convert::<T>(token)?;
        (**self.variable.borrow_mut()).add(value);
        Ok(())
    }

    fn is_cumulative(&self) -> bool {
        true
    }
}

impl<T> Collectable<T> for Vec<T> {
    fn add(&mut self, item: T) {
        self.push(item);
    }
}

impl<T: Eq + std::hash::Hash> Collectable<T> for HashSet<T> {
    fn add(&mut self, item: T) {
        self.insert(item);
    }
}

/// A field that accepts anything and keeps nothing, for the parser's own clauses (ex: `--help`).
pub(crate) struct Discard {
    boolean: bool,
    cumulative: bool,
}

impl Discard {
    pub(crate) fn switch() -> Self {
        Self {
            boolean: true,
            cumulative: true,
        }
    }

    pub(crate) fn remainder() -> Self {
        Self {
            boolean: false,
            cumulative: true,
        }
    }
}

impl CliFlag for Discard {}
impl CliArgument for Discard {}

impl<'a> GenericCapturable<'a, String> for Discard {
    fn capture(&mut self, _token: &str) -> Result<(), InvalidCapture> {
        Ok(())
    }

    fn is_boolean(&self) -> bool {
        self.boolean
    }

    fn is_cumulative(&self) -> bool {
        self.cumulative
    }
}
