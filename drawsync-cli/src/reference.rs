//! The diagram format reference printed by `drawsync format`.

/// Reference text for diagram files.
pub const FORMAT_REFERENCE: &str = r##"drawsync diagram format
=======================

A diagram file is YAML with up to three top-level lists: shapes, texts and
connectors. Every list is optional; an empty file is an empty diagram.

shapes
------
  - id: api                    required, unique across the file
    type: rectangle            rectangle | ellipse | diamond | text | group
    pos: [100, 100, 200x80]    [x, y] | [x, y, WIDTHxHEIGHT] | [x, y, w, h]
    label: API                 text drawn inside the shape
    z: 0                       stacking order, higher is drawn later
    color:
      stroke: "#1e1e1e"        outline (default #1e1e1e)
      bg: light-blue           fill, hex or palette name (default transparent)
    style:
      fillStyle: solid         solid | hachure | cross-hatch
      strokeWidth: 2
      strokeStyle: solid       solid | dashed | dotted
      roughness: 1             0 architect, 1 artist, 2 cartoonist
      opacity: 100             0 to 100
    fontSize: 16               label size (default 16)
    fontFamily: virgil         virgil | helvetica | cascadia | numeric id

  A shape list entry with `text:` and no `type` is a text.

groups
------
  - id: backend
    type: group
    pos: [400, 50]             origin; member positions are relative to it
    z: 2                       inherited by members without their own z
    shapes:                    `children` is accepted too
      - id: db
        type: rectangle
        pos: [0, 0, 160x60]

  Groups cannot contain groups. Moving a group re-pushes all its members.

texts
-----
  - id: title                  optional, generated as _text_0, _text_1, ...
    text: Architecture         required
    pos: [100, 20]             [x, y]
    color: { stroke: "#1e1e1e" }
    fontSize: 20               default 20
    fontFamily: helvetica

connectors
----------
  - from: api                  required, a shape id
    to: db                     required, a shape id
    id: api-to-db              default "{from}-to-{to}"
    type: arrow                arrow | line (default arrow)
    label: queries
    startArrowhead: none       arrow | bar | dot | triangle | none (default none)
    endArrowhead: arrow        default arrow for arrows, none for lines
    color: { stroke: "#1e1e1e" }
    style: { strokeWidth: 2, strokeStyle: dashed }

  Connectors are clipped to the edges of both shapes and always drawn on top.

palette
-------
  light-blue #a5d8ff   red    #ffc9c9   green #b2f2bb   yellow #ffec99
  purple     #d0bfff   orange #ffd8a8   gray  #dee2e6   pink   #fcc2d7
  cyan       #99e9f2   white  #ffffff   black #1e1e1e

state
-----
  `drawsync push arch.yaml` writes arch.state.json next to the diagram. It
  maps each id to the element created on the canvas, so later pushes only
  touch what changed. Use `--clear` to start over.
"##;
