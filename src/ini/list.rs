//! Treating one value as a delimited list of items.

/// Edit applied to a list value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEdit {
    /// Append the item unless it is already present.
    Insert,
    /// Remove the first matching item.
    Remove,
}

/// A decoded list value together with the separator used to re-join it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListValue {
    items: Vec<String>,
    joiner: String,
}

impl ListValue {
    /// Split `value` into items.
    ///
    /// - `None`: comma separated, items trimmed. Items are re-joined with
    ///   `", "` unless the value has commas but no spaces.
    /// - `Some("")`: whitespace separated, re-joined with the first run of
    ///   whitespace found in the value (a single space if there is none).
    /// - `Some(sep)`: split verbatim on `sep`.
    ///
    /// # Examples
    ///
    /// ```
    /// use iniedit_cli::ini::ListValue;
    ///
    /// let list = ListValue::decode("a,b , c", None);
    /// assert_eq!(list.items(), ["a", "b", "c"]);
    ///
    /// let list = ListValue::decode("x\ty", Some(""));
    /// assert_eq!(list.items(), ["x", "y"]);
    /// ```
    #[must_use]
    pub fn decode(value: &str, separator: Option<&str>) -> Self {
        match separator {
            None => {
                let spaced = value.contains(' ') || !value.contains(',');
                let items = if value.is_empty() {
                    Vec::new()
                } else {
                    value.split(',').map(|item| item.trim().to_string()).collect()
                };
                Self {
                    items,
                    joiner: if spaced { ", " } else { "," }.to_string(),
                }
            }
            Some("") => {
                let joiner = first_whitespace_run(value).unwrap_or(" ").to_string();
                let mut items: Vec<String> =
                    value.split_whitespace().map(str::to_string).collect();
                if value.starts_with(&joiner) {
                    items.insert(0, String::new());
                }
                Self { items, joiner }
            }
            Some(sep) => Self {
                items: if value.is_empty() {
                    Vec::new()
                } else {
                    value.split(sep).map(str::to_string).collect()
                },
                joiner: sep.to_string(),
            },
        }
    }

    /// The decoded items.
    #[must_use]
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Apply `edit` for `item`. Returns whether the list changed.
    pub fn apply(&mut self, edit: ListEdit, item: &str) -> bool {
        let position = self.items.iter().position(|existing| existing == item);
        match (edit, position) {
            (ListEdit::Insert, None) => {
                self.items.push(item.to_string());
                true
            }
            (ListEdit::Remove, Some(index)) => {
                self.items.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Join the items back into a single value.
    ///
    /// # Examples
    ///
    /// ```
    /// use iniedit_cli::ini::{ListEdit, ListValue};
    ///
    /// let mut list = ListValue::decode("a,b", None);
    /// assert!(list.apply(ListEdit::Insert, "c"));
    /// assert!(!list.apply(ListEdit::Insert, "a"));
    /// assert_eq!(list.encode(), "a,b,c");
    /// ```
    #[must_use]
    pub fn encode(&self) -> String {
        self.items.join(&self.joiner)
    }
}

fn first_whitespace_run(value: &str) -> Option<&str> {
    let start = value.find(char::is_whitespace)?;
    let tail = value.get(start..)?;
    let len = tail
        .find(|c: char| !c.is_whitespace())
        .unwrap_or(tail.len());
    tail.get(..len)
}

/// Decode `current`, apply `edit` for `item` and encode the result.
#[must_use]
pub fn edit_list(current: &str, separator: Option<&str>, edit: ListEdit, item: &str) -> String {
    let mut list = ListValue::decode(current, separator);
    list.apply(edit, item);
    list.encode()
}
