use crate::platform::Platform;
use crate::{MAX_KEY_NUL_TERMINATED_LENGTH, MAX_VALUE_NUL_TERMINATED_LENGTH, Settings};
use core::fmt::{self, Write};

const KEY_COLUMN: usize = MAX_KEY_NUL_TERMINATED_LENGTH;
const VALUE_COLUMN: usize = MAX_VALUE_NUL_TERMINATED_LENGTH;

impl<T: Platform> Settings<T> {
    /// Writes the table as
    ///
    /// ```text
    /// +---+----------+----------+----------+
    /// |IDX| Key      | Value    |   Type   |
    /// +---+----------+----------+----------+
    /// |0  | MAGIC... | 30539... | INT      |
    /// +---+----------+----------+----------+
    /// ```
    pub(crate) fn render<W: Write>(&self, w: &mut W) -> fmt::Result {
        separator(w)?;
        writeln!(
            w,
            "|IDX| {:<key$} | {:<value$} |   Type   |",
            "Key",
            "Value",
            key = KEY_COLUMN,
            value = VALUE_COLUMN
        )?;
        separator(w)?;
        for (idx, entry) in self.entries().iter().enumerate() {
            let type_name: &'static str = entry.value_type.into();
            writeln!(
                w,
                "|{:<3}| {:<key$} | {:<value$} | {:<8} |",
                idx,
                entry.key.as_str(),
                entry.value(),
                type_name,
                key = KEY_COLUMN,
                value = VALUE_COLUMN
            )?;
        }
        separator(w)
    }

    pub(crate) fn log_table(&self) {
        #[cfg(any(feature = "defmt", feature = "debug-logs"))]
        {
            let mut table = alloc::string::String::new();
            if self.render(&mut table).is_err() {
                return;
            }
            for _line in table.lines() {
                #[cfg(feature = "defmt")]
                defmt::info!("{=str}", _line);

                #[cfg(feature = "debug-logs")]
                println!("{_line}");
            }
        }
    }
}

impl<T: Platform> fmt::Display for Settings<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f)
    }
}

fn separator<W: Write>(w: &mut W) -> fmt::Result {
    writeln!(
        w,
        "+---+{:-<key$}+{:-<value$}+----------+",
        "",
        "",
        key = KEY_COLUMN + 2,
        value = VALUE_COLUMN + 2
    )
}
