use crate::event::{Event, EventData};
use crate::scanner::Scanner;
use crate::token::{Token, TokenData};
use crate::{
    MappingStyle, Mark, ParserError, ScalarStyle, SequenceStyle, TagDirective, VersionDirective,
};

/// The states of the parser.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
enum ParserState {
    /// Expect STREAM-START.
    #[default]
    StreamStart,
    /// Expect the beginning of an implicit document.
    ImplicitDocumentStart,
    /// Expect DOCUMENT-START.
    DocumentStart,
    /// Expect the content of a document.
    DocumentContent,
    /// Expect DOCUMENT-END.
    DocumentEnd,
    /// Expect a block node.
    BlockNode,
    /// Expect a block node or indentless sequence.
    BlockNodeOrIndentlessSequence,
    /// Expect a flow node.
    FlowNode,
    /// Expect the first entry of a block sequence.
    BlockSequenceFirstEntry,
    /// Expect an entry of a block sequence.
    BlockSequenceEntry,
    /// Expect an entry of an indentless sequence.
    IndentlessSequenceEntry,
    /// Expect the first key of a block mapping.
    BlockMappingFirstKey,
    /// Expect a block mapping key.
    BlockMappingKey,
    /// Expect a block mapping value.
    BlockMappingValue,
    /// Expect the first entry of a flow sequence.
    FlowSequenceFirstEntry,
    /// Expect an entry of a flow sequence.
    FlowSequenceEntry,
    /// Expect a key of an ordered mapping.
    FlowSequenceEntryMappingKey,
    /// Expect a value of an ordered mapping.
    FlowSequenceEntryMappingValue,
    /// Expect the end of an ordered mapping entry.
    FlowSequenceEntryMappingEnd,
    /// Expect the first key of a flow mapping.
    FlowMappingFirstKey,
    /// Expect a key of a flow mapping.
    FlowMappingKey,
    /// Expect a value of a flow mapping.
    FlowMappingValue,
    /// Expect an empty value of a flow mapping.
    FlowMappingEmptyValue,
    /// Expect nothing.
    End,
}

/// The event generator.
///
/// Each state examines the next token, emits one event, and pushes successor
/// states; the explicit stack lets a state re-enter its collection context
/// after a nested node completes.
pub struct Parser {
    pub(crate) scanner: Scanner,
    states: Vec<ParserState>,
    state: ParserState,
    marks: Vec<Mark>,
    tag_directives: Vec<TagDirective>,
}

impl Parser {
    pub fn new(scanner: Scanner) -> Self {
        Self {
            scanner,
            states: Vec::with_capacity(16),
            state: ParserState::default(),
            marks: Vec::with_capacity(16),
            tag_directives: Vec::with_capacity(16),
        }
    }

    /// Produce the next parsing event.
    ///
    /// The first event is StreamStart and the last is StreamEnd; calling
    /// again after StreamEnd keeps returning StreamEnd.
    pub fn parse(&mut self) -> Result<Event, ParserError> {
        if self.scanner.stream_end_produced || self.state == ParserState::End {
            return Ok(Event::new(EventData::StreamEnd));
        }
        let event = self.state_machine()?;
        log::trace!("event {:?} at {}", event.data, event.start_mark);
        Ok(event)
    }

    fn peek_token(&mut self) -> Result<&Token, ParserError> {
        Ok(self.scanner.peek()?)
    }

    fn peek_token_mut(&mut self) -> Result<&mut Token, ParserError> {
        Ok(self.scanner.peek_mut()?)
    }

    fn skip_token(&mut self) {
        self.scanner.skip_token();
    }

    fn error<T>(problem: &'static str, mark: Mark) -> Result<T, ParserError> {
        Err(ParserError::Problem { problem, mark })
    }

    fn error_context<T>(
        context: &'static str,
        context_mark: Mark,
        problem: &'static str,
        mark: Mark,
    ) -> Result<T, ParserError> {
        Err(ParserError::ProblemWithContext {
            context,
            context_mark,
            problem,
            mark,
        })
    }

    fn state_machine(&mut self) -> Result<Event, ParserError> {
        match self.state {
            ParserState::StreamStart => self.parse_stream_start(),
            ParserState::ImplicitDocumentStart => self.parse_document_start(true),
            ParserState::DocumentStart => self.parse_document_start(false),
            ParserState::DocumentContent => self.parse_document_content(),
            ParserState::DocumentEnd => self.parse_document_end(),
            ParserState::BlockNode => self.parse_node(true, false),
            ParserState::BlockNodeOrIndentlessSequence => self.parse_node(true, true),
            ParserState::FlowNode => self.parse_node(false, false),
            ParserState::BlockSequenceFirstEntry => self.parse_block_sequence_entry(true),
            ParserState::BlockSequenceEntry => self.parse_block_sequence_entry(false),
            ParserState::IndentlessSequenceEntry => self.parse_indentless_sequence_entry(),
            ParserState::BlockMappingFirstKey => self.parse_block_mapping_key(true),
            ParserState::BlockMappingKey => self.parse_block_mapping_key(false),
            ParserState::BlockMappingValue => self.parse_block_mapping_value(),
            ParserState::FlowSequenceFirstEntry => self.parse_flow_sequence_entry(true),
            ParserState::FlowSequenceEntry => self.parse_flow_sequence_entry(false),
            ParserState::FlowSequenceEntryMappingKey => {
                self.parse_flow_sequence_entry_mapping_key()
            }
            ParserState::FlowSequenceEntryMappingValue => {
                self.parse_flow_sequence_entry_mapping_value()
            }
            ParserState::FlowSequenceEntryMappingEnd => {
                self.parse_flow_sequence_entry_mapping_end()
            }
            ParserState::FlowMappingFirstKey => self.parse_flow_mapping_key(true),
            ParserState::FlowMappingKey => self.parse_flow_mapping_key(false),
            ParserState::FlowMappingValue => self.parse_flow_mapping_value(false),
            ParserState::FlowMappingEmptyValue => self.parse_flow_mapping_value(true),
            ParserState::End => panic!("parser end state reached unexpectedly"),
        }
    }

    fn parse_stream_start(&mut self) -> Result<Event, ParserError> {
        let token = self.peek_token()?;
        if let TokenData::StreamStart { encoding } = &token.data {
            let event = Event::spanning(
                EventData::StreamStart {
                    encoding: *encoding,
                },
                token.start_mark,
                token.end_mark,
            );
            self.state = ParserState::ImplicitDocumentStart;
            self.skip_token();
            Ok(event)
        } else {
            let mark = token.start_mark;
            Self::error("did not find expected <stream-start>", mark)
        }
    }

    fn parse_document_start(&mut self, implicit: bool) -> Result<Event, ParserError> {
        let mut token = self.peek_token()?;
        if !implicit {
            while let TokenData::DocumentEnd = &token.data {
                self.skip_token();
                token = self.peek_token()?;
            }
        }
        if implicit
            && !matches!(
                token.data,
                TokenData::VersionDirective { .. }
                    | TokenData::TagDirective { .. }
                    | TokenData::DocumentStart
                    | TokenData::StreamEnd
            )
        {
            let event = Event::spanning(
                EventData::DocumentStart {
                    version_directive: None,
                    tag_directives: vec![],
                    implicit: true,
                },
                token.start_mark,
                token.end_mark,
            );
            self.process_directives(None, None)?;
            self.states.push(ParserState::DocumentEnd);
            self.state = ParserState::BlockNode;
            Ok(event)
        } else if !matches!(token.data, TokenData::StreamEnd) {
            let start_mark = token.start_mark;
            let mut version_directive = None;
            let mut tag_directives = vec![];
            self.process_directives(Some(&mut version_directive), Some(&mut tag_directives))?;
            let token = self.peek_token()?;
            if let TokenData::DocumentStart = token.data {
                let event = Event::spanning(
                    EventData::DocumentStart {
                        version_directive,
                        tag_directives,
                        implicit: false,
                    },
                    start_mark,
                    token.end_mark,
                );
                self.states.push(ParserState::DocumentEnd);
                self.state = ParserState::DocumentContent;
                self.skip_token();
                Ok(event)
            } else {
                Self::error("did not find expected <document start>", token.start_mark)
            }
        } else {
            let event = Event::spanning(
                EventData::StreamEnd,
                token.start_mark,
                token.end_mark,
            );
            self.state = ParserState::End;
            self.skip_token();
            Ok(event)
        }
    }

    fn parse_document_content(&mut self) -> Result<Event, ParserError> {
        let token = self.peek_token()?;
        if let TokenData::VersionDirective { .. }
        | TokenData::TagDirective { .. }
        | TokenData::DocumentStart
        | TokenData::DocumentEnd
        | TokenData::StreamEnd = &token.data
        {
            let mark = token.start_mark;
            self.state = self.states.pop().unwrap();
            Self::empty_scalar(mark)
        } else {
            self.parse_node(true, false)
        }
    }

    fn parse_document_end(&mut self) -> Result<Event, ParserError> {
        let token = self.peek_token()?;
        let start_mark = token.start_mark;
        let mut end_mark = start_mark;
        let mut implicit = true;
        if let TokenData::DocumentEnd = &token.data {
            end_mark = token.end_mark;
            self.skip_token();
            implicit = false;
        }
        self.tag_directives.clear();
        self.state = ParserState::DocumentStart;
        Ok(Event::spanning(
            EventData::DocumentEnd { implicit },
            start_mark,
            end_mark,
        ))
    }

    fn parse_node(&mut self, block: bool, indentless_sequence: bool) -> Result<Event, ParserError> {
        let mut anchor: Option<String> = None;
        let mut tag_handle: Option<String> = None;
        let mut tag_suffix: Option<String> = None;
        let mut tag: Option<String> = None;
        let mut tag_mark = Mark::default();

        let mut token = self.peek_token_mut()?;

        if let TokenData::Alias { value } = &mut token.data {
            let event = Event::spanning(
                EventData::Alias {
                    anchor: std::mem::take(value),
                },
                token.start_mark,
                token.end_mark,
            );
            self.state = self.states.pop().unwrap();
            self.skip_token();
            return Ok(event);
        }

        let mut start_mark = token.start_mark;
        let mut end_mark = token.start_mark;
        if let TokenData::Anchor { value } = &mut token.data {
            anchor = Some(std::mem::take(value));
            start_mark = token.start_mark;
            end_mark = token.end_mark;
            self.skip_token();
            token = self.peek_token_mut()?;
            if let TokenData::Tag { handle, suffix } = &mut token.data {
                tag_handle = Some(std::mem::take(handle));
                tag_suffix = Some(std::mem::take(suffix));
                tag_mark = token.start_mark;
                end_mark = token.end_mark;
                self.skip_token();
            }
        } else if let TokenData::Tag { handle, suffix } = &mut token.data {
            tag_handle = Some(std::mem::take(handle));
            tag_suffix = Some(std::mem::take(suffix));
            tag_mark = token.start_mark;
            start_mark = tag_mark;
            end_mark = token.end_mark;
            self.skip_token();
            token = self.peek_token_mut()?;
            if let TokenData::Anchor { value } = &mut token.data {
                anchor = Some(std::mem::take(value));
                end_mark = token.end_mark;
                self.skip_token();
            }
        }

        if let Some(tag_handle_value) = &tag_handle {
            if tag_handle_value.is_empty() {
                // Verbatim tag.
                tag = tag_suffix;
            } else {
                for tag_directive in &self.tag_directives {
                    if tag_directive.handle == *tag_handle_value {
                        let suffix = tag_suffix.as_deref().unwrap_or("");
                        tag = Some(format!("{}{}", tag_directive.prefix, suffix));
                        break;
                    }
                }
                if tag.is_none() {
                    return Self::error_context(
                        "while parsing a node",
                        start_mark,
                        "found undefined tag handle",
                        tag_mark,
                    );
                }
            }
        }

        let token = self.peek_token_mut()?;
        let implicit = tag.is_none() || tag.as_deref() == Some("");

        if indentless_sequence && matches!(token.data, TokenData::BlockEntry) {
            end_mark = token.end_mark;
            self.state = ParserState::IndentlessSequenceEntry;
            return Ok(Event::spanning(
                EventData::SequenceStart {
                    anchor,
                    tag,
                    implicit,
                    style: SequenceStyle::Block,
                },
                start_mark,
                end_mark,
            ));
        }
        if let TokenData::Scalar { value, style } = &mut token.data {
            let mut plain_implicit = false;
            let mut quoted_implicit = false;
            end_mark = token.end_mark;
            if *style == ScalarStyle::Plain && tag.is_none() || tag.as_deref() == Some("!") {
                plain_implicit = true;
            } else if tag.is_none() {
                quoted_implicit = true;
            }
            let event = Event::spanning(
                EventData::Scalar {
                    anchor,
                    tag,
                    value: std::mem::take(value),
                    plain_implicit,
                    quoted_implicit,
                    style: *style,
                },
                start_mark,
                end_mark,
            );
            self.state = self.states.pop().unwrap();
            self.skip_token();
            return Ok(event);
        }
        if let TokenData::FlowSequenceStart = &token.data {
            end_mark = token.end_mark;
            self.state = ParserState::FlowSequenceFirstEntry;
            return Ok(Event::spanning(
                EventData::SequenceStart {
                    anchor,
                    tag,
                    implicit,
                    style: SequenceStyle::Flow,
                },
                start_mark,
                end_mark,
            ));
        }
        if let TokenData::FlowMappingStart = &token.data {
            end_mark = token.end_mark;
            self.state = ParserState::FlowMappingFirstKey;
            return Ok(Event::spanning(
                EventData::MappingStart {
                    anchor,
                    tag,
                    implicit,
                    style: MappingStyle::Flow,
                },
                start_mark,
                end_mark,
            ));
        }
        if block && matches!(token.data, TokenData::BlockSequenceStart) {
            end_mark = token.end_mark;
            self.state = ParserState::BlockSequenceFirstEntry;
            return Ok(Event::spanning(
                EventData::SequenceStart {
                    anchor,
                    tag,
                    implicit,
                    style: SequenceStyle::Block,
                },
                start_mark,
                end_mark,
            ));
        }
        if block && matches!(token.data, TokenData::BlockMappingStart) {
            end_mark = token.end_mark;
            self.state = ParserState::BlockMappingFirstKey;
            return Ok(Event::spanning(
                EventData::MappingStart {
                    anchor,
                    tag,
                    implicit,
                    style: MappingStyle::Block,
                },
                start_mark,
                end_mark,
            ));
        }
        if anchor.is_some() || tag.is_some() {
            // An anchor or tag with no following content stands for an
            // empty scalar node.
            self.state = self.states.pop().unwrap();
            return Ok(Event::spanning(
                EventData::Scalar {
                    anchor,
                    tag,
                    value: String::new(),
                    plain_implicit: implicit,
                    quoted_implicit: false,
                    style: ScalarStyle::Plain,
                },
                start_mark,
                end_mark,
            ));
        }
        Self::error_context(
            if block {
                "while parsing a block node"
            } else {
                "while parsing a flow node"
            },
            start_mark,
            "did not find expected node content",
            token.start_mark,
        )
    }

    fn parse_block_sequence_entry(&mut self, first: bool) -> Result<Event, ParserError> {
        if first {
            let token = self.peek_token()?;
            let mark = token.start_mark;
            self.marks.push(mark);
            self.skip_token();
        }

        let token = self.peek_token()?;
        if let TokenData::BlockEntry = &token.data {
            let mark = token.end_mark;
            self.skip_token();
            let token = self.peek_token()?;
            if matches!(token.data, TokenData::BlockEntry | TokenData::BlockEnd) {
                self.state = ParserState::BlockSequenceEntry;
                Self::empty_scalar(mark)
            } else {
                self.states.push(ParserState::BlockSequenceEntry);
                self.parse_node(true, false)
            }
        } else if let TokenData::BlockEnd = token.data {
            let event = Event::spanning(EventData::SequenceEnd, token.start_mark, token.end_mark);
            self.state = self.states.pop().unwrap();
            let _ = self.marks.pop();
            self.skip_token();
            Ok(event)
        } else {
            let token_mark = token.start_mark;
            let mark = self.marks.pop().unwrap();
            Self::error_context(
                "while parsing a block collection",
                mark,
                "did not find expected '-' indicator",
                token_mark,
            )
        }
    }

    fn parse_indentless_sequence_entry(&mut self) -> Result<Event, ParserError> {
        let token = self.peek_token()?;
        if let TokenData::BlockEntry = token.data {
            let mark = token.end_mark;
            self.skip_token();
            let token = self.peek_token()?;
            if matches!(
                token.data,
                TokenData::BlockEntry | TokenData::Key | TokenData::Value | TokenData::BlockEnd
            ) {
                self.state = ParserState::IndentlessSequenceEntry;
                Self::empty_scalar(mark)
            } else {
                self.states.push(ParserState::IndentlessSequenceEntry);
                self.parse_node(true, false)
            }
        } else {
            let event = Event::spanning(EventData::SequenceEnd, token.start_mark, token.end_mark);
            self.state = self.states.pop().unwrap();
            Ok(event)
        }
    }

    fn parse_block_mapping_key(&mut self, first: bool) -> Result<Event, ParserError> {
        if first {
            let token = self.peek_token()?;
            let mark = token.start_mark;
            self.marks.push(mark);
            self.skip_token();
        }

        let token = self.peek_token()?;
        if let TokenData::Key = token.data {
            let mark = token.end_mark;
            self.skip_token();
            let token = self.peek_token()?;
            if matches!(
                token.data,
                TokenData::Key | TokenData::Value | TokenData::BlockEnd
            ) {
                self.state = ParserState::BlockMappingValue;
                Self::empty_scalar(mark)
            } else {
                self.states.push(ParserState::BlockMappingValue);
                self.parse_node(true, true)
            }
        } else if let TokenData::BlockEnd = token.data {
            let event = Event::spanning(EventData::MappingEnd, token.start_mark, token.end_mark);
            self.state = self.states.pop().unwrap();
            let _ = self.marks.pop();
            self.skip_token();
            Ok(event)
        } else {
            let token_mark = token.start_mark;
            let mark = self.marks.pop().unwrap();
            Self::error_context(
                "while parsing a block mapping",
                mark,
                "did not find expected key",
                token_mark,
            )
        }
    }

    fn parse_block_mapping_value(&mut self) -> Result<Event, ParserError> {
        let token = self.peek_token()?;
        if let TokenData::Value = token.data {
            let mark = token.end_mark;
            self.skip_token();
            let token = self.peek_token()?;
            if matches!(
                token.data,
                TokenData::Key | TokenData::Value | TokenData::BlockEnd
            ) {
                self.state = ParserState::BlockMappingKey;
                Self::empty_scalar(mark)
            } else {
                self.states.push(ParserState::BlockMappingKey);
                self.parse_node(true, true)
            }
        } else {
            let mark = token.start_mark;
            self.state = ParserState::BlockMappingKey;
            Self::empty_scalar(mark)
        }
    }

    fn parse_flow_sequence_entry(&mut self, first: bool) -> Result<Event, ParserError> {
        if first {
            let token = self.peek_token()?;
            let mark = token.start_mark;
            self.marks.push(mark);
            self.skip_token();
        }

        let mut token = self.peek_token()?;
        if !matches!(token.data, TokenData::FlowSequenceEnd) {
            if !first {
                if let TokenData::FlowEntry = token.data {
                    self.skip_token();
                    token = self.peek_token()?;
                } else {
                    let token_mark = token.start_mark;
                    let mark = self.marks.pop().unwrap();
                    return Self::error_context(
                        "while parsing a flow sequence",
                        mark,
                        "did not find expected ',' or ']'",
                        token_mark,
                    );
                }
            }
            if let TokenData::Key = token.data {
                // A single `key: value` pair inside a flow sequence is an
                // implicit mapping of one entry.
                let event = Event::spanning(
                    EventData::MappingStart {
                        anchor: None,
                        tag: None,
                        implicit: true,
                        style: MappingStyle::Flow,
                    },
                    token.start_mark,
                    token.end_mark,
                );
                self.state = ParserState::FlowSequenceEntryMappingKey;
                self.skip_token();
                return Ok(event);
            } else if !matches!(token.data, TokenData::FlowSequenceEnd) {
                self.states.push(ParserState::FlowSequenceEntry);
                return self.parse_node(false, false);
            }
        }
        let event = Event::spanning(EventData::SequenceEnd, token.start_mark, token.end_mark);
        self.state = self.states.pop().unwrap();
        let _ = self.marks.pop();
        self.skip_token();
        Ok(event)
    }

    fn parse_flow_sequence_entry_mapping_key(&mut self) -> Result<Event, ParserError> {
        let token = self.peek_token()?;
        if matches!(
            token.data,
            TokenData::Value | TokenData::FlowEntry | TokenData::FlowSequenceEnd
        ) {
            let mark = token.end_mark;
            self.skip_token();
            self.state = ParserState::FlowSequenceEntryMappingValue;
            Self::empty_scalar(mark)
        } else {
            self.states.push(ParserState::FlowSequenceEntryMappingValue);
            self.parse_node(false, false)
        }
    }

    fn parse_flow_sequence_entry_mapping_value(&mut self) -> Result<Event, ParserError> {
        let token = self.peek_token()?;
        if let TokenData::Value = token.data {
            self.skip_token();
            let token = self.peek_token()?;
            if !matches!(
                token.data,
                TokenData::FlowEntry | TokenData::FlowSequenceEnd
            ) {
                self.states.push(ParserState::FlowSequenceEntryMappingEnd);
                return self.parse_node(false, false);
            }
            let mark = token.start_mark;
            self.state = ParserState::FlowSequenceEntryMappingEnd;
            Self::empty_scalar(mark)
        } else {
            let mark = token.start_mark;
            self.state = ParserState::FlowSequenceEntryMappingEnd;
            Self::empty_scalar(mark)
        }
    }

    fn parse_flow_sequence_entry_mapping_end(&mut self) -> Result<Event, ParserError> {
        let token = self.peek_token()?;
        let start_mark = token.start_mark;
        let end_mark = token.end_mark;
        self.state = ParserState::FlowSequenceEntry;
        Ok(Event::spanning(EventData::MappingEnd, start_mark, end_mark))
    }

    fn parse_flow_mapping_key(&mut self, first: bool) -> Result<Event, ParserError> {
        if first {
            let token = self.peek_token()?;
            let mark = token.start_mark;
            self.marks.push(mark);
            self.skip_token();
        }

        let mut token = self.peek_token()?;
        if !matches!(token.data, TokenData::FlowMappingEnd) {
            if !first {
                if let TokenData::FlowEntry = token.data {
                    self.skip_token();
                    token = self.peek_token()?;
                } else {
                    let token_mark = token.start_mark;
                    let mark = self.marks.pop().unwrap();
                    return Self::error_context(
                        "while parsing a flow mapping",
                        mark,
                        "did not find expected ',' or '}'",
                        token_mark,
                    );
                }
            }
            if let TokenData::Key = token.data {
                self.skip_token();
                let token = self.peek_token()?;
                if !matches!(
                    token.data,
                    TokenData::Value | TokenData::FlowEntry | TokenData::FlowMappingEnd
                ) {
                    self.states.push(ParserState::FlowMappingValue);
                    return self.parse_node(false, false);
                }
                let mark = token.start_mark;
                self.state = ParserState::FlowMappingValue;
                return Self::empty_scalar(mark);
            } else if !matches!(token.data, TokenData::FlowMappingEnd) {
                self.states.push(ParserState::FlowMappingEmptyValue);
                return self.parse_node(false, false);
            }
        }
        let event = Event::spanning(EventData::MappingEnd, token.start_mark, token.end_mark);
        self.state = self.states.pop().unwrap();
        let _ = self.marks.pop();
        self.skip_token();
        Ok(event)
    }

    fn parse_flow_mapping_value(&mut self, empty: bool) -> Result<Event, ParserError> {
        let token = self.peek_token()?;
        if empty {
            let mark = token.start_mark;
            self.state = ParserState::FlowMappingKey;
            return Self::empty_scalar(mark);
        }
        if let TokenData::Value = token.data {
            self.skip_token();
            let token = self.peek_token()?;
            if !matches!(token.data, TokenData::FlowEntry | TokenData::FlowMappingEnd) {
                self.states.push(ParserState::FlowMappingKey);
                return self.parse_node(false, false);
            }
            let mark = token.start_mark;
            self.state = ParserState::FlowMappingKey;
            Self::empty_scalar(mark)
        } else {
            let mark = token.start_mark;
            self.state = ParserState::FlowMappingKey;
            Self::empty_scalar(mark)
        }
    }

    fn empty_scalar(mark: Mark) -> Result<Event, ParserError> {
        Ok(Event::spanning(
            EventData::Scalar {
                anchor: None,
                tag: None,
                value: String::new(),
                plain_implicit: true,
                quoted_implicit: false,
                style: ScalarStyle::Plain,
            },
            mark,
            mark,
        ))
    }

    /// Accumulate `%YAML` and `%TAG` directives up to the document start.
    /// Versions other than 1.1 are tolerated with a warning; duplicate
    /// directives within one document are not.
    fn process_directives(
        &mut self,
        version_directive_ref: Option<&mut Option<VersionDirective>>,
        tag_directives_ref: Option<&mut Vec<TagDirective>>,
    ) -> Result<(), ParserError> {
        let default_tag_directives: [TagDirective; 2] = [
            TagDirective {
                handle: String::from("!"),
                prefix: String::from("!"),
            },
            TagDirective {
                handle: String::from("!!"),
                prefix: String::from("tag:yaml.org,2002:"),
            },
        ];
        let mut version_directive: Option<VersionDirective> = None;
        let mut tag_directives = Vec::new();

        let mut token = self.peek_token_mut()?;
        loop {
            if !matches!(
                token.data,
                TokenData::VersionDirective { .. } | TokenData::TagDirective { .. }
            ) {
                break;
            }

            if let TokenData::VersionDirective { major, minor } = &token.data {
                let mark = token.start_mark;
                if version_directive.is_some() {
                    return Self::error("found duplicate %YAML directive", mark);
                }
                if *major != 1 || *minor != 1 {
                    log::warn!(
                        "document declares YAML {major}.{minor} at {mark}; \
                         parsing it as YAML 1.1"
                    );
                }
                version_directive = Some(VersionDirective {
                    major: *major,
                    minor: *minor,
                });
            } else if let TokenData::TagDirective { handle, prefix } = &mut token.data {
                let value = TagDirective {
                    handle: std::mem::take(handle),
                    prefix: std::mem::take(prefix),
                };
                let mark = token.start_mark;
                self.append_tag_directive(value.clone(), false, mark)?;
                tag_directives.push(value);
            }

            self.skip_token();
            token = self.peek_token_mut()?;
        }

        let start_mark = token.start_mark;
        for default_tag_directive in default_tag_directives {
            self.append_tag_directive(default_tag_directive, true, start_mark)?;
        }

        if let Some(version_directive_ref) = version_directive_ref {
            *version_directive_ref = version_directive;
        }
        if let Some(tag_directives_ref) = tag_directives_ref {
            *tag_directives_ref = tag_directives;
        }
        Ok(())
    }

    fn append_tag_directive(
        &mut self,
        value: TagDirective,
        allow_duplicates: bool,
        mark: Mark,
    ) -> Result<(), ParserError> {
        for tag_directive in &self.tag_directives {
            if value.handle == tag_directive.handle {
                if allow_duplicates {
                    return Ok(());
                }
                return Self::error("found duplicate %TAG directive", mark);
            }
        }
        self.tag_directives.push(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    fn parse_all(input: &str) -> Result<Vec<Event>, ParserError> {
        let reader = Reader::new(input.as_bytes(), None).unwrap();
        let mut parser = Parser::new(Scanner::new(reader));
        let mut events = Vec::new();
        loop {
            let event = parser.parse()?;
            let done = matches!(event.data, EventData::StreamEnd);
            events.push(event);
            if done {
                break;
            }
        }
        Ok(events)
    }

    fn kinds(events: &[Event]) -> Vec<&'static str> {
        events
            .iter()
            .map(|event| match &event.data {
                EventData::StreamStart { .. } => "stream-start",
                EventData::StreamEnd => "stream-end",
                EventData::DocumentStart { .. } => "document-start",
                EventData::DocumentEnd { .. } => "document-end",
                EventData::Alias { .. } => "alias",
                EventData::Scalar { .. } => "scalar",
                EventData::SequenceStart { .. } => "sequence-start",
                EventData::SequenceEnd => "sequence-end",
                EventData::MappingStart { .. } => "mapping-start",
                EventData::MappingEnd => "mapping-end",
            })
            .collect()
    }

    #[test]
    fn mapping_produces_balanced_events() {
        let events = parse_all("key: value\n").unwrap();
        assert_eq!(
            kinds(&events),
            vec![
                "stream-start",
                "document-start",
                "mapping-start",
                "scalar",
                "scalar",
                "mapping-end",
                "document-end",
                "stream-end",
            ]
        );
    }

    #[test]
    fn empty_document_marker_yields_empty_scalar() {
        let events = parse_all("---\n").unwrap();
        assert_eq!(
            kinds(&events),
            vec![
                "stream-start",
                "document-start",
                "scalar",
                "document-end",
                "stream-end",
            ]
        );
        assert!(events.iter().any(|event| matches!(
            &event.data,
            EventData::Scalar { value, .. } if value.is_empty()
        )));
    }

    #[test]
    fn empty_input_has_no_documents() {
        let events = parse_all("").unwrap();
        assert_eq!(kinds(&events), vec!["stream-start", "stream-end"]);
    }

    #[test]
    fn multiple_documents() {
        let events = parse_all("---\none\n---\ntwo\n").unwrap();
        let document_starts = events
            .iter()
            .filter(|event| matches!(event.data, EventData::DocumentStart { .. }))
            .count();
        assert_eq!(document_starts, 2);
    }

    #[test]
    fn tag_shorthand_resolves_through_directives() {
        let events =
            parse_all("%TAG !e! tag:example.org,2002:\n---\n!e!thing x\n").unwrap();
        assert!(events.iter().any(|event| matches!(
            &event.data,
            EventData::Scalar { tag: Some(tag), .. } if tag == "tag:example.org,2002:thing"
        )));
    }

    #[test]
    fn secondary_handle_resolves_to_yaml_namespace() {
        let events = parse_all("!!str 3\n").unwrap();
        assert!(events.iter().any(|event| matches!(
            &event.data,
            EventData::Scalar { tag: Some(tag), plain_implicit: false, .. }
                if tag == "tag:yaml.org,2002:str"
        )));
    }

    #[test]
    fn undefined_tag_handle_is_an_error() {
        let err = parse_all("!x!foo bar\n").unwrap_err();
        assert!(err.to_string().contains("found undefined tag handle"));
    }

    #[test]
    fn duplicate_yaml_directive_is_an_error() {
        let err = parse_all("%YAML 1.1\n%YAML 1.1\n---\nx\n").unwrap_err();
        assert!(err.to_string().contains("duplicate %YAML directive"));
    }

    #[test]
    fn non_1_1_version_is_tolerated() {
        let events = parse_all("%YAML 1.2\n---\nx\n").unwrap();
        assert!(events.iter().any(|event| matches!(
            &event.data,
            EventData::DocumentStart {
                version_directive: Some(VersionDirective { major: 1, minor: 2 }),
                ..
            }
        )));
    }

    #[test]
    fn flow_pair_inside_sequence_becomes_single_pair_mapping() {
        let events = parse_all("[a: b]\n").unwrap();
        assert_eq!(
            kinds(&events),
            vec![
                "stream-start",
                "document-start",
                "sequence-start",
                "mapping-start",
                "scalar",
                "scalar",
                "mapping-end",
                "sequence-end",
                "document-end",
                "stream-end",
            ]
        );
    }

    #[test]
    fn anchors_and_aliases_flow_through() {
        let events = parse_all("a: &x 1\nb: *x\n").unwrap();
        assert!(events.iter().any(|event| matches!(
            &event.data,
            EventData::Scalar { anchor: Some(anchor), .. } if anchor == "x"
        )));
        assert!(events.iter().any(|event| matches!(
            &event.data,
            EventData::Alias { anchor } if anchor == "x"
        )));
    }

    #[test]
    fn block_mapping_missing_value_becomes_empty_scalar() {
        let events = parse_all("a:\nb: 2\n").unwrap();
        let scalars: Vec<_> = events
            .iter()
            .filter_map(|event| match &event.data {
                EventData::Scalar { value, .. } => Some(value.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(scalars, vec!["a", "", "b", "2"]);
    }
}
