//! JSON rendering of parse trees.
//!
//! Every node shape implements [`DumpJson`], so any tree a grammar
//! produces (including host trees built through `map`, as long as they
//! implement the trait too) can be rendered to a `serde_json::Value` for
//! inspection or export. Choice nodes carry the index of the winning
//! alternative; leaves carry their text.

use crate::ast::{
    Alternative2, Alternative3, Alternative4, Alternative5, Alternative6, ChoiceNode, Leaf,
    OptNode, RepeatNode, SeqNode, Token,
};
use serde_json::{json, Value};

/// Renders a parse tree node as JSON.
pub trait DumpJson {
    /// The JSON representation of this node and its children.
    fn to_json(&self) -> Value;
}

impl DumpJson for Leaf {
    fn to_json(&self) -> Value {
        json!({
            "ruleId": self.rule_id,
            "type": "literal",
            "text": self.text,
            "start": self.start,
            "end": self.end,
        })
    }
}

impl DumpJson for Token {
    fn to_json(&self) -> Value {
        json!({
            "ruleId": self.rule_id,
            "type": "token",
            "text": self.text,
            "start": self.start,
            "end": self.end,
        })
    }
}

impl<T: DumpJson> DumpJson for OptNode<T> {
    fn to_json(&self) -> Value {
        json!({
            "ruleId": self.rule_id,
            "type": "optional",
            "start": self.start,
            "end": self.end,
            "value": match &self.value {
                Some(value) => value.to_json(),
                None => Value::Null,
            },
        })
    }
}

impl<T: DumpJson> DumpJson for RepeatNode<T> {
    fn to_json(&self) -> Value {
        let items: Vec<Value> = self.items.iter().map(DumpJson::to_json).collect();
        json!({
            "ruleId": self.rule_id,
            "type": "repeat",
            "start": self.start,
            "end": self.end,
            "items": items,
        })
    }
}

macro_rules! choice_dump {
    ($( $alt:ident : $( $var:ident $ty:ident ),+ ; )+) => { $(
        impl<$($ty: DumpJson),+> DumpJson for $alt<$($ty),+> {
            fn to_json(&self) -> Value {
                match self {
                    $( $alt::$var(inner) => inner.to_json(), )+
                }
            }
        }

        impl<$($ty: DumpJson),+> DumpJson for ChoiceNode<$alt<$($ty),+>> {
            fn to_json(&self) -> Value {
                json!({
                    "ruleId": self.rule_id,
                    "type": "choice",
                    "alternative": self.value.index(),
                    "start": self.start,
                    "end": self.end,
                    "value": self.value.to_json(),
                })
            }
        }
    )+ }
}

choice_dump! {
    Alternative2: First A, Second B;
    Alternative3: First A, Second B, Third C;
    Alternative4: First A, Second B, Third C, Fourth D;
    Alternative5: First A, Second B, Third C, Fourth D, Fifth E;
    Alternative6: First A, Second B, Third C, Fourth D, Fifth E, Sixth F;
}

macro_rules! seq_dump {
    ($( $( $idx:tt $ty:ident ),+ ; )+) => { $(
        impl<$($ty: DumpJson),+> DumpJson for SeqNode<($($ty,)+)> {
            fn to_json(&self) -> Value {
                json!({
                    "ruleId": self.rule_id,
                    "type": "sequence",
                    "start": self.start,
                    "end": self.end,
                    "items": [ $( self.items.$idx.to_json() ),+ ],
                })
            }
        }
    )+ }
}

seq_dump! {
    0 A, 1 B;
    0 A, 1 B, 2 C;
    0 A, 1 B, 2 C, 3 D;
    0 A, 1 B, 2 C, 3 D, 4 E;
    0 A, 1 B, 2 C, 3 D, 4 E, 5 F;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinator::{choice, seq};
    use crate::rule::Rule;
    use crate::stream::TextStream;
    use crate::token::{digits, lit};

    fn stream(text: &str) -> TextStream {
        let mut stream = TextStream::push_mode();
        stream.write_tail(text.as_bytes()).unwrap();
        stream
    }

    #[test]
    fn test_token_dump_fields() {
        let mut input = stream("123");
        let result = digits(1).parse(&mut input).unwrap();
        let value = result.ast.to_json();
        assert_eq!(value["type"], "token");
        assert_eq!(value["ruleId"], 1);
        assert_eq!(value["text"], "123");
        assert_eq!(value["start"]["line"], 1);
        assert_eq!(value["start"]["column"], 0);
    }

    #[test]
    fn test_choice_dump_carries_alternative() {
        let rule = choice(4, (lit(1, "if"), lit(2, "else")));
        let mut input = stream("else");
        let result = rule.parse(&mut input).unwrap();
        let value = result.ast.to_json();
        assert_eq!(value["type"], "choice");
        assert_eq!(value["alternative"], 1);
        assert_eq!(value["value"]["text"], "else");
    }

    #[test]
    fn test_sequence_dump_lists_items() {
        let rule = seq(4, (lit(1, "if"), digits(2)));
        let mut input = stream("if 42");
        let result = rule.parse(&mut input).unwrap();
        let value = result.ast.to_json();
        assert_eq!(value["type"], "sequence");
        assert_eq!(value["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["items"][1]["text"], "42");
    }
}
