use rustyline::history::History;
use rustyline::{Editor, ExternalPrinter as RLExternalPrinter, Helper};
use std::fmt::Display;
use std::sync::{Mutex, PoisonError};

/// [`ExternalPrinter`] safe print messages to stdout while editor waits for user input.
pub struct ExternalPrinter {
    printer: Mutex<Box<dyn RLExternalPrinter + Send>>,
}

impl ExternalPrinter {
    pub fn new<H: Helper, I: History>(editor: &mut Editor<H, I>) -> rustyline::Result<Self> {
        let external_p = editor.create_external_printer()?;
        Ok(Self {
            printer: Mutex::new(Box::new(external_p)),
        })
    }

    pub fn print(&self, msg: impl Display) {
        let msg = msg.to_string();
        let mut printer = self.printer.lock().unwrap_or_else(PoisonError::into_inner);
        // editor thread is gone
        if printer.print(msg.clone()).is_err() {
            println!("{msg}")
        }
    }
}

pub mod style {
    use crossterm::style::{Color, Stylize};
    use std::fmt::{Display, Formatter};

    const UNKNOWN_PLACEHOLDER: &str = "???";

    struct View<T: Display> {
        inner: Option<T>,
        color: Color,
    }

    impl<T: Display> Display for View<T> {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            let text = self
                .inner
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| UNKNOWN_PLACEHOLDER.to_string());
            f.write_fmt(format_args!("{}", text.with(self.color)))
        }
    }

    /// Construct structure declaration to display data of the same type (locators, ids, etc.).
    macro_rules! view_struct {
        ($name: ident, $color: expr) => {
            pub struct $name<T: Display>(View<T>);

            impl<T: Display> From<T> for $name<T> {
                fn from(value: T) -> Self {
                    Self(View {
                        inner: Some(value),
                        color: $color,
                    })
                }
            }

            impl<T: Display> From<Option<T>> for $name<T> {
                fn from(value: Option<T>) -> Self {
                    Self(View {
                        inner: value,
                        color: $color,
                    })
                }
            }

            impl<T: Display> Display for $name<T> {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    self.0.fmt(f)
                }
            }
        };
    }

    view_struct!(IdView, Color::Blue);
    view_struct!(LocatorView, Color::Green);
    view_struct!(FunctionNameView, Color::Yellow);
    view_struct!(KeywordView, Color::Magenta);
    view_struct!(ErrorView, Color::Red);
}
